//! Configuration types, built from environment variables.

use secrecy::SecretString;

use crate::email::annotation::DEFAULT_OVERSIGHT_ADDRESS;

/// Server-wide configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Path of the libSQL database file.
    pub db_path: String,
    /// Recipient address that triggers subject annotation.
    pub oversight_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: "./data/call-desk.db".to_string(),
            oversight_address: DEFAULT_OVERSIGHT_ADDRESS.to_string(),
        }
    }
}

impl AppConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port: u16 = std::env::var("CALL_DESK_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let db_path = std::env::var("CALL_DESK_DB_PATH").unwrap_or(defaults.db_path);

        let oversight_address = std::env::var("CALL_DESK_OVERSIGHT_ADDRESS")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.oversight_address);

        Self {
            port,
            db_path,
            oversight_address,
        }
    }
}

/// SMTP transport configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set (sending disabled).
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let host = var("SMTP_HOST").filter(|s| !s.is_empty())?;

        let port: u16 = var("SMTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = var("SMTP_USERNAME").unwrap_or_default();
        let password = SecretString::from(var("SMTP_PASSWORD").unwrap_or_default());
        let from_address = var("SMTP_FROM_ADDRESS").unwrap_or_else(|| username.clone());

        Some(Self {
            host,
            port,
            username,
            password,
            from_address,
        })
    }
}
