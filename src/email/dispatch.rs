//! Outbound email dispatch.
//!
//! Runs the annotation rule, hands the message to the transport, and
//! collapses transport errors into a generic `DispatchOutcome::Failure`.
//! The real error goes to the log, never to the caller.

use std::sync::Arc;

use tracing::error;

use super::annotation::AnnotationRule;
use super::transport::{MailTransport, OutgoingEmail};

/// Message returned to callers for any delivery failure.
pub const SEND_FAILED_MESSAGE: &str = "Failed to send email";

/// One send request. The signature is always supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Raw recipients value, possibly several addresses joined in one string.
    pub recipients: String,
    pub subject: String,
    pub html_content: String,
    pub signature: String,
    pub company_name: Option<String>,
}

/// Result of a single send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success,
    Failure { message: String },
}

/// Stateless dispatcher, shared across requests.
#[derive(Clone)]
pub struct EmailDispatcher {
    transport: Arc<dyn MailTransport>,
    rule: AnnotationRule,
}

impl EmailDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, rule: AnnotationRule) -> Self {
        Self { transport, rule }
    }

    pub fn rule(&self) -> &AnnotationRule {
        &self.rule
    }

    /// Make one best-effort delivery attempt. No retries.
    pub async fn send(&self, request: &SendRequest) -> DispatchOutcome {
        let decision = self.rule.decide(
            &request.subject,
            request.company_name.as_deref(),
            &request.recipients,
        );

        let email = OutgoingEmail {
            recipients: request.recipients.clone(),
            subject: decision.final_subject,
            html_content: request.html_content.clone(),
            signature: request.signature.clone(),
        };

        match self.transport.deliver(&email).await {
            Ok(()) => DispatchOutcome::Success,
            Err(e) => {
                error!(to = %email.recipients, subject = %email.subject, error = %e, "Email delivery failed");
                DispatchOutcome::Failure {
                    message: SEND_FAILED_MESSAGE.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::email::annotation::DEFAULT_OVERSIGHT_ADDRESS;
    use crate::error::TransportError;

    /// Records every delivery; optionally fails.
    struct RecordingTransport {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    impl RecordingTransport {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(email.clone());
            if self.fail {
                Err(TransportError::Smtp("550 mailbox unavailable at relay.internal".into()))
            } else {
                Ok(())
            }
        }
    }

    fn request(to: &str, subject: &str) -> SendRequest {
        SendRequest {
            recipients: to.into(),
            subject: subject.into(),
            html_content: "<p>Tere!</p>".into(),
            signature: "<i>Mari</i>".into(),
            company_name: None,
        }
    }

    #[tokio::test]
    async fn success_passes_subject_through() {
        let transport = RecordingTransport::new(false);
        let dispatcher = EmailDispatcher::new(transport.clone(), AnnotationRule::default());

        let outcome = dispatcher.send(&request("client@acme.com", "Offer")).await;

        assert_eq!(outcome, DispatchOutcome::Success);
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Offer");
        assert_eq!(sent[0].signature, "<i>Mari</i>");
    }

    #[tokio::test]
    async fn oversight_copy_gets_annotated_subject() {
        let transport = RecordingTransport::new(false);
        let dispatcher = EmailDispatcher::new(transport.clone(), AnnotationRule::default());

        let to = format!("client@acme.com, {DEFAULT_OVERSIGHT_ADDRESS}");
        let outcome = dispatcher
            .send(&request(
                &to,
                "Kohtumine: DigiAgentuur OÜ ja Acme Inc - 2023-10-15 10:00",
            ))
            .await;

        assert_eq!(outcome, DispatchOutcome::Success);
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "KOOPIA+ Acme Inc");
        assert_eq!(sent[0].recipients, to);
    }

    #[tokio::test]
    async fn transport_error_is_hidden_from_caller() {
        let transport = RecordingTransport::new(true);
        let dispatcher = EmailDispatcher::new(transport.clone(), AnnotationRule::default());

        let outcome = dispatcher.send(&request("client@acme.com", "Offer")).await;

        match outcome {
            DispatchOutcome::Failure { message } => {
                assert_eq!(message, SEND_FAILED_MESSAGE);
                assert!(!message.contains("550"));
            }
            DispatchOutcome::Success => panic!("expected failure"),
        }
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }
}
