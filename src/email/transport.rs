//! Mail transport: the collaborator that actually delivers messages.
//!
//! `SmtpTransport` sends HTML mail through an SMTP relay via lettre.
//! `UnconfiguredTransport` stands in when no relay is configured.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, Transport};
use secrecy::ExposeSecret;

use crate::config::SmtpConfig;
use crate::error::{ConfigError, TransportError};

/// A fully resolved outgoing message, subject already annotated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Raw recipients value, possibly several addresses joined by `,` or `;`.
    pub recipients: String,
    pub subject: String,
    pub html_content: String,
    pub signature: String,
}

impl OutgoingEmail {
    /// Individual addresses from the raw recipients value.
    pub fn recipient_list(&self) -> Vec<&str> {
        self.recipients
            .split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Content followed by the signature, if there is one.
    pub fn html_body(&self) -> String {
        if self.signature.trim().is_empty() {
            self.html_content.clone()
        } else {
            format!("{}<br><br>{}", self.html_content, self.signature)
        }
    }
}

/// Something that can deliver an `OutgoingEmail`.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), TransportError>;
}

/// SMTP relay transport (rustls TLS).
pub struct SmtpTransport {
    from: Mailbox,
    inner: lettre::SmtpTransport,
}

impl SmtpTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, ConfigError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_FROM_ADDRESS".into(),
                message: format!("{e}"),
            })?;

        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let inner = lettre::SmtpTransport::relay(&config.host)
            .map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_HOST".into(),
                message: format!("SMTP relay error: {e}"),
            })?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self { from, inner })
    }

    /// Build the lettre message for `email`.
    pub fn build_message(&self, email: &OutgoingEmail) -> Result<Message, TransportError> {
        let recipients = email.recipient_list();
        if recipients.is_empty() {
            return Err(TransportError::NoRecipients(email.recipients.clone()));
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML);

        for address in recipients {
            let mailbox = address.parse::<Mailbox>().map_err(|e| {
                TransportError::InvalidAddress {
                    address: address.to_string(),
                    reason: e.to_string(),
                }
            })?;
            builder = builder.to(mailbox);
        }

        builder
            .body(email.html_body())
            .map_err(|e| TransportError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        let message = self.build_message(email)?;
        let inner = self.inner.clone();

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || inner.send(&message))
            .await
            .map_err(|e| TransportError::Smtp(format!("send task panicked: {e}")))?
            .map_err(|e| TransportError::Smtp(e.to_string()))?;

        tracing::info!(to = %email.recipients, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Transport used when `SMTP_HOST` is unset. Every delivery fails.
pub struct UnconfiguredTransport;

#[async_trait]
impl MailTransport for UnconfiguredTransport {
    async fn deliver(&self, _email: &OutgoingEmail) -> Result<(), TransportError> {
        Err(TransportError::NotConfigured)
    }
}
