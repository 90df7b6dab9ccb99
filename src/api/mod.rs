//! HTTP boundary: axum router, shared state, and error mapping.

pub mod email;
pub mod records;

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;

use crate::email::EmailDispatcher;
use crate::error::{ApiError, DatabaseError};
use crate::store::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub dispatcher: EmailDispatcher,
}

/// Build the Axum router with every REST route.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/send-email", post(email::send_email))
        .route("/api/placeholders", get(email::list_placeholders))
        .route(
            "/api/contacts",
            get(records::list_contacts).post(records::create_contact),
        )
        .route(
            "/api/contacts/{id}",
            get(records::get_contact)
                .put(records::update_contact)
                .delete(records::delete_contact),
        )
        .route(
            "/api/templates",
            get(records::list_templates).post(records::create_template),
        )
        .route(
            "/api/templates/{id}",
            get(records::get_template)
                .put(records::update_template)
                .delete(records::delete_template),
        )
        .route("/api/templates/{id}/render", post(email::render_template))
        .route(
            "/api/scripts",
            get(records::list_scripts).post(records::create_script),
        )
        .route(
            "/api/scripts/{id}",
            get(records::get_script)
                .put(records::update_script)
                .delete(records::delete_script),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "call-desk"
    }))
}

/// Parse a JSON request body. An empty body yields the default value.
///
/// Any parse failure is logged and surfaces as the generic 500, so every
/// error response keeps the `{ "error": ... }` shape.
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse request body");
        ApiError::Internal
    })
}

/// `{ "error": message }` with the given status.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// `{ "success": true }`
pub(crate) fn success_response() -> Response {
    Json(serde_json::json!({ "success": true })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, &self.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        tracing::error!(error = %e, "Database operation failed");
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::email::{AnnotationRule, UnconfiguredTransport};
    use crate::store::LibSqlBackend;

    async fn app() -> Router {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let dispatcher =
            EmailDispatcher::new(Arc::new(UnconfiguredTransport), AnnotationRule::default());
        api_routes(AppState { db, dispatcher })
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = app()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn send_without_smtp_is_generic_failure() {
        let request = Request::post("/api/send-email")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"to":"client@acme.com","subject":"Offer","content":"<p>Hi</p>"}"#,
            ))
            .unwrap();
        let resp = app().await.oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({ "error": "Failed to send email" })
        );
    }

    #[test]
    fn parse_body_defaults_when_empty() {
        let fields: crate::model::ScriptFields = parse_body(&Bytes::new()).unwrap();
        assert!(fields.title.is_none());
        assert!(parse_body::<crate::model::ScriptFields>(&Bytes::from_static(b"{oops")).is_err());
        assert!(
            parse_body::<crate::model::ScriptFields>(&Bytes::from_static(br#"{"title":5}"#))
                .is_err()
        );
    }

    #[tokio::test]
    async fn malformed_crud_body_is_json_500() {
        let request = Request::post("/api/contacts")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app().await.oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({ "error": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn api_error_status_mapping() {
        let resp = ApiError::BadRequest("Missing required field: name".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Missing required field: name");

        let resp = ApiError::NotFound { entity: "Script" }.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"], "Script not found");

        let resp = ApiError::from(DatabaseError::Query("disk I/O error".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "Internal server error");
    }
}
