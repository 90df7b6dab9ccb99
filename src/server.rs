//! Startup wiring: database, transport, dispatcher, router.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::AppState;
use crate::config::{AppConfig, SmtpConfig};
use crate::email::{
    AnnotationRule, EmailDispatcher, MailTransport, SmtpTransport, UnconfiguredTransport,
};
use crate::error::Result;
use crate::store::{Database, LibSqlBackend};

/// Pick the transport for `smtp`, falling back to one that always fails.
pub fn build_transport(smtp: Option<&SmtpConfig>) -> Result<Arc<dyn MailTransport>> {
    match smtp {
        Some(config) => {
            info!(host = %config.host, port = config.port, "SMTP transport enabled");
            Ok(Arc::new(SmtpTransport::new(config)?))
        }
        None => {
            warn!("SMTP_HOST not set; email sending is disabled");
            Ok(Arc::new(UnconfiguredTransport))
        }
    }
}

/// Open the database and assemble the shared handler state.
pub async fn build_state(config: &AppConfig, smtp: Option<&SmtpConfig>) -> Result<AppState> {
    let db: Arc<dyn Database> =
        Arc::new(LibSqlBackend::new_local(Path::new(&config.db_path)).await?);
    let transport = build_transport(smtp)?;
    let dispatcher =
        EmailDispatcher::new(transport, AnnotationRule::new(&config.oversight_address));
    Ok(AppState { db, dispatcher })
}

/// Serve `app` on `listener` until the process is stopped.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server started");
    }
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_state_opens_database_without_smtp() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            db_path: dir.path().join("desk.db").to_string_lossy().into_owned(),
            oversight_address: "audit@example.com".into(),
            ..AppConfig::default()
        };

        let state = build_state(&config, None).await.unwrap();
        assert!(state.db.list_contacts().await.unwrap().is_empty());
        assert_eq!(state.dispatcher.rule().oversight_address(), "audit@example.com");
    }
}
