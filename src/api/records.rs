//! CRUD endpoints for contacts, email templates, and call scripts.
//!
//! `PUT` merges: fields present in the body overwrite, absent fields are
//! kept. An empty string clears an optional contact field.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use super::{AppState, parse_body, success_response};
use crate::error::ApiError;
use crate::model::{
    CallScript, Contact, ContactFields, EmailTemplate, ScriptFields, TemplateFields,
};

/// Trimmed value, or `None` when absent or blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    non_blank(value).ok_or_else(|| ApiError::BadRequest(format!("Missing required field: {field}")))
}

/// For updates: `None` keeps the current value, a blank value is rejected.
fn replace_required(current: &mut String, value: Option<String>, field: &str) -> Result<(), ApiError> {
    if value.is_some() {
        *current = required(value, field)?;
    }
    Ok(())
}

fn deleted(found: bool, entity: &'static str) -> Result<Response, ApiError> {
    if found {
        Ok(success_response())
    } else {
        Err(ApiError::NotFound { entity })
    }
}

// ── Contacts ────────────────────────────────────────────────────────────

pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.db.list_contacts().await?))
}

pub async fn create_contact(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let fields: ContactFields = parse_body(&body)?;
    let mut contact = Contact::new(required(fields.name, "name")?);
    contact.company = non_blank(fields.company);
    contact.email = non_blank(fields.email);
    contact.phone = non_blank(fields.phone);
    contact.notes = non_blank(fields.notes);

    state.db.insert_contact(&contact).await?;
    tracing::info!(contact_id = %contact.id, "Contact created");
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    state
        .db
        .get_contact(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound { entity: "Contact" })
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Contact>, ApiError> {
    let fields: ContactFields = parse_body(&body)?;
    let mut contact = state
        .db
        .get_contact(&id)
        .await?
        .ok_or(ApiError::NotFound { entity: "Contact" })?;

    replace_required(&mut contact.name, fields.name, "name")?;
    for (slot, value) in [
        (&mut contact.company, fields.company),
        (&mut contact.email, fields.email),
        (&mut contact.phone, fields.phone),
        (&mut contact.notes, fields.notes),
    ] {
        if value.is_some() {
            *slot = non_blank(value);
        }
    }
    contact.updated_at = Utc::now();

    if !state.db.update_contact(&contact).await? {
        return Err(ApiError::NotFound { entity: "Contact" });
    }
    Ok(Json(contact))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    deleted(state.db.delete_contact(&id).await?, "Contact")
}

// ── Email templates ─────────────────────────────────────────────────────

pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmailTemplate>>, ApiError> {
    Ok(Json(state.db.list_templates().await?))
}

pub async fn create_template(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let fields: TemplateFields = parse_body(&body)?;
    let template = EmailTemplate::new(
        required(fields.name, "name")?,
        required(fields.subject, "subject")?,
        required(fields.content, "content")?,
    );

    state.db.insert_template(&template).await?;
    tracing::info!(template_id = %template.id, "Template created");
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmailTemplate>, ApiError> {
    state
        .db
        .get_template(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound { entity: "Template" })
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<EmailTemplate>, ApiError> {
    let fields: TemplateFields = parse_body(&body)?;
    let mut template = state
        .db
        .get_template(&id)
        .await?
        .ok_or(ApiError::NotFound { entity: "Template" })?;

    replace_required(&mut template.name, fields.name, "name")?;
    replace_required(&mut template.subject, fields.subject, "subject")?;
    replace_required(&mut template.content, fields.content, "content")?;
    template.updated_at = Utc::now();

    if !state.db.update_template(&template).await? {
        return Err(ApiError::NotFound { entity: "Template" });
    }
    Ok(Json(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    deleted(state.db.delete_template(&id).await?, "Template")
}

// ── Call scripts ────────────────────────────────────────────────────────

pub async fn list_scripts(
    State(state): State<AppState>,
) -> Result<Json<Vec<CallScript>>, ApiError> {
    Ok(Json(state.db.list_scripts().await?))
}

pub async fn create_script(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let fields: ScriptFields = parse_body(&body)?;
    let script = CallScript::new(
        required(fields.title, "title")?,
        required(fields.content, "content")?,
    );

    state.db.insert_script(&script).await?;
    tracing::info!(script_id = %script.id, "Script created");
    Ok((StatusCode::CREATED, Json(script)))
}

pub async fn get_script(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CallScript>, ApiError> {
    state
        .db
        .get_script(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound { entity: "Script" })
}

pub async fn update_script(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<CallScript>, ApiError> {
    let fields: ScriptFields = parse_body(&body)?;
    let mut script = state
        .db
        .get_script(&id)
        .await?
        .ok_or(ApiError::NotFound { entity: "Script" })?;

    replace_required(&mut script.title, fields.title, "title")?;
    replace_required(&mut script.content, fields.content, "content")?;
    script.updated_at = Utc::now();

    if !state.db.update_script(&script).await? {
        return Err(ApiError::NotFound { entity: "Script" });
    }
    Ok(Json(script))
}

pub async fn delete_script(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    deleted(state.db.delete_script(&id).await?, "Script")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(Some("  Acme ".into())).as_deref(), Some("Acme"));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn replace_required_keeps_current_when_absent() {
        let mut name = "Old".to_string();
        replace_required(&mut name, None, "name").unwrap();
        assert_eq!(name, "Old");
        replace_required(&mut name, Some("New".into()), "name").unwrap();
        assert_eq!(name, "New");
        assert!(matches!(
            replace_required(&mut name, Some(" ".into()), "name"),
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(name, "New");
    }
}
