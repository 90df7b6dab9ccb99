//! Outbound email: subject annotation, dispatch, transport, templates.

pub mod annotation;
pub mod dispatch;
pub mod placeholders;
pub mod transport;

pub use annotation::{AnnotationDecision, AnnotationRule};
pub use dispatch::{DispatchOutcome, EmailDispatcher, SendRequest};
pub use transport::{MailTransport, OutgoingEmail, SmtpTransport, UnconfiguredTransport};
