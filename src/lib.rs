//! call-desk: contacts, templates, scripts, and outbound email.

pub mod api;
pub mod config;
pub mod email;
pub mod error;
pub mod model;
pub mod server;
pub mod store;
