//! Email endpoints: send, template rendering, placeholder listing.

use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{AppState, error_response, parse_body, success_response};
use crate::email::placeholders::{self, AVAILABLE_PLACEHOLDERS};
use crate::email::{DispatchOutcome, SendRequest};
use crate::error::ApiError;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: to, subject, or content";

/// Recipients as sent by the client: one joined string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    /// The raw recipients value the annotation rule scans.
    pub fn joined(&self) -> String {
        match self {
            Recipients::One(s) => s.clone(),
            Recipients::Many(list) => list.join(", "),
        }
    }
}

/// JSON body of `POST /api/send-email`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailBody {
    #[serde(default)]
    pub to: Option<Recipients>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

impl SendEmailBody {
    /// Validate required fields and build the dispatch request.
    pub fn into_request(self) -> Option<SendRequest> {
        let recipients = self.to.map(|r| r.joined()).filter(|s| !s.is_empty())?;
        let subject = self.subject.filter(|s| !s.is_empty())?;
        let html_content = self.content.filter(|s| !s.is_empty())?;
        Some(SendRequest {
            recipients,
            subject,
            html_content,
            signature: self.signature.unwrap_or_default(),
            company_name: self.company_name,
        })
    }
}

/// POST /api/send-email
pub async fn send_email(State(state): State<AppState>, body: Bytes) -> Response {
    let parsed: SendEmailBody = match parse_body(&body) {
        Ok(parsed) => parsed,
        Err(e) => return e.into_response(),
    };

    let Some(request) = parsed.into_request() else {
        warn!("Send-email request missing required fields");
        return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE);
    };

    match state.dispatcher.send(&request).await {
        DispatchOutcome::Success => success_response(),
        DispatchOutcome::Failure { message } => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &message)
        }
    }
}

/// GET /api/placeholders
pub async fn list_placeholders() -> impl IntoResponse {
    Json(AVAILABLE_PLACEHOLDERS)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderBody {
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub values: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTemplate {
    pub subject: String,
    pub content: String,
    /// Placeholders still present after substitution.
    pub unresolved: Vec<String>,
}

/// POST /api/templates/{id}/render
///
/// Contact-derived values are applied first; explicit `values` override them.
pub async fn render_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<RenderedTemplate>, ApiError> {
    let body: RenderBody = parse_body(&body)?;
    let template = state
        .db
        .get_template(&id)
        .await?
        .ok_or(ApiError::NotFound { entity: "Template" })?;

    let mut values = HashMap::new();
    if let Some(contact_id) = body.contact_id.as_deref() {
        let contact = state
            .db
            .get_contact(contact_id)
            .await?
            .ok_or(ApiError::NotFound { entity: "Contact" })?;
        values = placeholders::values_for_contact(&contact);
    }
    values.extend(body.values);

    let subject = placeholders::render(&template.subject, &values);
    let content = placeholders::render(&template.content, &values);

    let mut unresolved = placeholders::placeholders_in(&subject);
    for name in placeholders::placeholders_in(&content) {
        if !unresolved.contains(&name) {
            unresolved.push(name);
        }
    }

    Ok(Json(RenderedTemplate {
        subject,
        content,
        unresolved,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> SendEmailBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn list_recipients_are_joined() {
        let request = body(r#"{"to":["a@x.com","b@y.com"],"subject":"s","content":"c"}"#)
            .into_request()
            .unwrap();
        assert_eq!(request.recipients, "a@x.com, b@y.com");
        assert_eq!(request.signature, "");
        assert!(request.company_name.is_none());
    }

    #[test]
    fn camel_case_company_name() {
        let request = body(
            r#"{"to":"a@x.com","subject":"s","content":"c","signature":"sig","companyName":"Acme"}"#,
        )
        .into_request()
        .unwrap();
        assert_eq!(request.company_name.as_deref(), Some("Acme"));
        assert_eq!(request.signature, "sig");
    }

    #[test]
    fn missing_or_empty_required_fields_rejected() {
        assert!(body(r#"{"subject":"s","content":"c"}"#).into_request().is_none());
        assert!(body(r#"{"to":"","subject":"s","content":"c"}"#).into_request().is_none());
        assert!(body(r#"{"to":[],"subject":"s","content":"c"}"#).into_request().is_none());
        assert!(body(r#"{"to":"a@x.com","content":"c"}"#).into_request().is_none());
        assert!(body(r#"{"to":"a@x.com","subject":"s","content":null}"#).into_request().is_none());
    }

    #[test]
    fn whitespace_fields_count_as_present() {
        let request = body(r#"{"to":"a@x.com","subject":" ","content":"c"}"#)
            .into_request()
            .unwrap();
        assert_eq!(request.subject, " ");
    }
}
