//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::model::{CallScript, Contact, EmailTemplate};
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run a query expected to return at most one row.
    async fn query_one<T>(
        &self,
        op: &str,
        sql: &str,
        id: &str,
        map: fn(&libsql::Row) -> Result<T, libsql::Error>,
    ) -> Result<Option<T>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, params![id])
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => map(&row)
                .map(Some)
                .map_err(|e| DatabaseError::Query(format!("{op} row parse: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("{op}: {e}"))),
        }
    }

    /// Run a query returning many rows. Unparseable rows are skipped.
    async fn query_all<T>(
        &self,
        op: &str,
        sql: &str,
        map: fn(&libsql::Row) -> Result<T, libsql::Error>,
    ) -> Result<Vec<T>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, ())
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?
        {
            match map(&row) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!("Skipping {op} row: {e}"),
            }
        }
        Ok(items)
    }

    async fn delete_by_id(&self, op: &str, table: &str, id: &str) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;
        debug!(table, id, deleted = affected > 0, "Row delete");
        Ok(affected > 0)
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Column order: 0:id, 1:name, 2:company, 3:email, 4:phone, 5:notes, 6:created_at, 7:updated_at
fn row_to_contact(row: &libsql::Row) -> Result<Contact, libsql::Error> {
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        company: row.get(2).ok(),
        email: row.get(3).ok(),
        phone: row.get(4).ok(),
        notes: row.get(5).ok(),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

/// Column order: 0:id, 1:name, 2:subject, 3:content, 4:created_at, 5:updated_at
fn row_to_template(row: &libsql::Row) -> Result<EmailTemplate, libsql::Error> {
    let created_str: String = row.get(4)?;
    let updated_str: String = row.get(5)?;
    Ok(EmailTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        subject: row.get(2)?,
        content: row.get(3)?,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

/// Column order: 0:id, 1:title, 2:content, 3:created_at, 4:updated_at
fn row_to_script(row: &libsql::Row) -> Result<CallScript, libsql::Error> {
    let created_str: String = row.get(3)?;
    let updated_str: String = row.get(4)?;
    Ok(CallScript {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const CONTACT_COLUMNS: &str = "id, name, company, email, phone, notes, created_at, updated_at";

const TEMPLATE_COLUMNS: &str = "id, name, subject, content, created_at, updated_at";

const SCRIPT_COLUMNS: &str = "id, title, content, created_at, updated_at";

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Contacts ────────────────────────────────────────────────────

    async fn insert_contact(&self, contact: &Contact) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!("INSERT INTO contacts ({CONTACT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    contact.id.as_str(),
                    contact.name.as_str(),
                    opt_text(contact.company.as_deref()),
                    opt_text(contact.email.as_deref()),
                    opt_text(contact.phone.as_deref()),
                    opt_text(contact.notes.as_deref()),
                    contact.created_at.to_rfc3339(),
                    contact.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_contact: {e}")))?;

        debug!(contact_id = %contact.id, "Contact inserted into DB");
        Ok(())
    }

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, DatabaseError> {
        self.query_one(
            "get_contact",
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
            id,
            row_to_contact,
        )
        .await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, DatabaseError> {
        self.query_all(
            "list_contacts",
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY name COLLATE NOCASE ASC"),
            row_to_contact,
        )
        .await
    }

    async fn update_contact(&self, contact: &Contact) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE contacts SET name = ?1, company = ?2, email = ?3, phone = ?4, notes = ?5, updated_at = ?6 WHERE id = ?7",
                params![
                    contact.name.as_str(),
                    opt_text(contact.company.as_deref()),
                    opt_text(contact.email.as_deref()),
                    opt_text(contact.phone.as_deref()),
                    opt_text(contact.notes.as_deref()),
                    contact.updated_at.to_rfc3339(),
                    contact.id.as_str(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_contact: {e}")))?;

        debug!(contact_id = %contact.id, updated = affected > 0, "Contact update");
        Ok(affected > 0)
    }

    async fn delete_contact(&self, id: &str) -> Result<bool, DatabaseError> {
        self.delete_by_id("delete_contact", "contacts", id).await
    }

    // ── Email templates ─────────────────────────────────────────────

    async fn insert_template(&self, template: &EmailTemplate) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!("INSERT INTO email_templates ({TEMPLATE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    template.id.as_str(),
                    template.name.as_str(),
                    template.subject.as_str(),
                    template.content.as_str(),
                    template.created_at.to_rfc3339(),
                    template.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_template: {e}")))?;

        debug!(template_id = %template.id, "Template inserted into DB");
        Ok(())
    }

    async fn get_template(&self, id: &str) -> Result<Option<EmailTemplate>, DatabaseError> {
        self.query_one(
            "get_template",
            &format!("SELECT {TEMPLATE_COLUMNS} FROM email_templates WHERE id = ?1"),
            id,
            row_to_template,
        )
        .await
    }

    async fn list_templates(&self) -> Result<Vec<EmailTemplate>, DatabaseError> {
        self.query_all(
            "list_templates",
            &format!("SELECT {TEMPLATE_COLUMNS} FROM email_templates ORDER BY name COLLATE NOCASE ASC"),
            row_to_template,
        )
        .await
    }

    async fn update_template(&self, template: &EmailTemplate) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE email_templates SET name = ?1, subject = ?2, content = ?3, updated_at = ?4 WHERE id = ?5",
                params![
                    template.name.as_str(),
                    template.subject.as_str(),
                    template.content.as_str(),
                    template.updated_at.to_rfc3339(),
                    template.id.as_str(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_template: {e}")))?;

        debug!(template_id = %template.id, updated = affected > 0, "Template update");
        Ok(affected > 0)
    }

    async fn delete_template(&self, id: &str) -> Result<bool, DatabaseError> {
        self.delete_by_id("delete_template", "email_templates", id).await
    }

    // ── Call scripts ────────────────────────────────────────────────

    async fn insert_script(&self, script: &CallScript) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!("INSERT INTO call_scripts ({SCRIPT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                params![
                    script.id.as_str(),
                    script.title.as_str(),
                    script.content.as_str(),
                    script.created_at.to_rfc3339(),
                    script.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_script: {e}")))?;

        debug!(script_id = %script.id, "Script inserted into DB");
        Ok(())
    }

    async fn get_script(&self, id: &str) -> Result<Option<CallScript>, DatabaseError> {
        self.query_one(
            "get_script",
            &format!("SELECT {SCRIPT_COLUMNS} FROM call_scripts WHERE id = ?1"),
            id,
            row_to_script,
        )
        .await
    }

    async fn list_scripts(&self) -> Result<Vec<CallScript>, DatabaseError> {
        self.query_all(
            "list_scripts",
            &format!("SELECT {SCRIPT_COLUMNS} FROM call_scripts ORDER BY title COLLATE NOCASE ASC"),
            row_to_script,
        )
        .await
    }

    async fn update_script(&self, script: &CallScript) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE call_scripts SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    script.title.as_str(),
                    script.content.as_str(),
                    script.updated_at.to_rfc3339(),
                    script.id.as_str(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_script: {e}")))?;

        debug!(script_id = %script.id, updated = affected > 0, "Script update");
        Ok(affected > 0)
    }

    async fn delete_script(&self, id: &str) -> Result<bool, DatabaseError> {
        self.delete_by_id("delete_script", "call_scripts", id).await
    }
}

// ── Tests ───────────────────────────────────────────────────────────
