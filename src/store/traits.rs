//! `Database` trait, a single async interface for all persistence.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::model::{CallScript, Contact, EmailTemplate};

/// Backend-agnostic database trait covering contacts, templates, and scripts.
///
/// Update methods replace the stored row with the given record and report
/// whether a row with that id existed. Delete methods do the same.
#[async_trait]
pub trait Database: Send + Sync {
    /// Create tables and apply pending migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Contacts ────────────────────────────────────────────────────

    async fn insert_contact(&self, contact: &Contact) -> Result<(), DatabaseError>;

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, DatabaseError>;

    /// All contacts, ordered by name.
    async fn list_contacts(&self) -> Result<Vec<Contact>, DatabaseError>;

    async fn update_contact(&self, contact: &Contact) -> Result<bool, DatabaseError>;

    async fn delete_contact(&self, id: &str) -> Result<bool, DatabaseError>;

    // ── Email templates ─────────────────────────────────────────────

    async fn insert_template(&self, template: &EmailTemplate) -> Result<(), DatabaseError>;

    async fn get_template(&self, id: &str) -> Result<Option<EmailTemplate>, DatabaseError>;

    /// All templates, ordered by name.
    async fn list_templates(&self) -> Result<Vec<EmailTemplate>, DatabaseError>;

    async fn update_template(&self, template: &EmailTemplate) -> Result<bool, DatabaseError>;

    async fn delete_template(&self, id: &str) -> Result<bool, DatabaseError>;

    // ── Call scripts ────────────────────────────────────────────────

    async fn insert_script(&self, script: &CallScript) -> Result<(), DatabaseError>;

    async fn get_script(&self, id: &str) -> Result<Option<CallScript>, DatabaseError>;

    /// All scripts, ordered by title.
    async fn list_scripts(&self) -> Result<Vec<CallScript>, DatabaseError>;

    async fn update_script(&self, script: &CallScript) -> Result<bool, DatabaseError>;

    async fn delete_script(&self, id: &str) -> Result<bool, DatabaseError>;
}
