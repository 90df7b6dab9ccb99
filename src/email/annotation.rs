//! Subject annotation for copies sent to the oversight mailbox.
//!
//! When the oversight address appears anywhere in the raw recipients value,
//! the outgoing subject is replaced with `KOOPIA+ <company>`. The company is
//! taken from the caller, or pulled out of a meeting subject of the form
//! `Kohtumine: <us> ja <them> - <date>`, or falls back to a fixed literal.

use regex::Regex;
use tracing::debug;

/// Oversight mailbox used when no override is configured.
pub const DEFAULT_OVERSIGHT_ADDRESS: &str = "koopia@digiagentuur.ee";

/// Prefix placed in front of the company name on annotated subjects.
pub const ANNOTATION_PREFIX: &str = "KOOPIA+ ";

/// Company name used when neither the caller nor the subject provides one.
pub const FALLBACK_COMPANY_NAME: &str = "ETTEVÕTTE NIMI";

/// Outcome of running the rule on one send request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationDecision {
    pub should_annotate: bool,
    /// Empty when the rule did not trigger.
    pub resolved_company_name: String,
    pub final_subject: String,
}

/// The annotation rule, holding the trigger address and the compiled
/// subject pattern.
#[derive(Debug, Clone)]
pub struct AnnotationRule {
    oversight_address: String,
    company_pattern: Regex,
}

impl Default for AnnotationRule {
    fn default() -> Self {
        Self::new(DEFAULT_OVERSIGHT_ADDRESS)
    }
}

impl AnnotationRule {
    pub fn new(oversight_address: impl Into<String>) -> Self {
        Self {
            oversight_address: oversight_address.into().to_lowercase(),
            // ": <A> ja <B>", with B stopping before an optional " - <date>" tail
            company_pattern: Regex::new(r":\s*(.+?)\s+ja\s+(.+?)(?:\s+-\s+.*)?$").unwrap(),
        }
    }

    pub fn oversight_address(&self) -> &str {
        &self.oversight_address
    }

    /// Case-insensitive substring check against the unparsed recipients blob.
    pub fn is_triggered(&self, recipients: &str) -> bool {
        !self.oversight_address.is_empty()
            && recipients.to_lowercase().contains(&self.oversight_address)
    }

    /// Decide whether to rewrite `subject`, and to what.
    pub fn decide(
        &self,
        subject: &str,
        company_name: Option<&str>,
        recipients: &str,
    ) -> AnnotationDecision {
        if !self.is_triggered(recipients) {
            return AnnotationDecision {
                should_annotate: false,
                resolved_company_name: String::new(),
                final_subject: subject.to_string(),
            };
        }

        let resolved = company_name
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| self.company_from_subject(subject))
            .unwrap_or_else(|| FALLBACK_COMPANY_NAME.to_string());

        debug!(company = %resolved, "Annotating subject for oversight copy");

        AnnotationDecision {
            should_annotate: true,
            final_subject: format!("{ANNOTATION_PREFIX}{resolved}"),
            resolved_company_name: resolved,
        }
    }

    /// Second party of a `": A ja B"` subject, if present and non-empty.
    pub fn company_from_subject(&self, subject: &str) -> Option<String> {
        self.company_pattern
            .captures(subject)
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEETING_SUBJECT: &str = "Kohtumine: DigiAgentuur OÜ ja Acme Inc - 2023-10-15 10:00";

    fn rule() -> AnnotationRule {
        AnnotationRule::default()
    }

    #[test]
    fn subject_unchanged_without_oversight_address() {
        let decision = rule().decide(MEETING_SUBJECT, Some("Acme Inc"), "client@acme.com");
        assert!(!decision.should_annotate);
        assert_eq!(decision.final_subject, MEETING_SUBJECT);
        assert!(decision.resolved_company_name.is_empty());
    }

    #[test]
    fn company_extracted_from_meeting_subject() {
        let recipients = format!("client@acme.com, {DEFAULT_OVERSIGHT_ADDRESS}");
        let decision = rule().decide(MEETING_SUBJECT, None, &recipients);
        assert!(decision.should_annotate);
        assert_eq!(decision.resolved_company_name, "Acme Inc");
        assert_eq!(decision.final_subject, "KOOPIA+ Acme Inc");
    }

    #[test]
    fn explicit_company_name_wins_over_subject() {
        let decision = rule().decide(
            "Kohtumine: Foo ja Bar - 2024-01-01",
            Some("Acme Inc"),
            DEFAULT_OVERSIGHT_ADDRESS,
        );
        assert_eq!(decision.final_subject, "KOOPIA+ Acme Inc");
    }

    #[test]
    fn empty_company_name_falls_through_to_subject() {
        let decision = rule().decide(MEETING_SUBJECT, Some(""), DEFAULT_OVERSIGHT_ADDRESS);
        assert_eq!(decision.final_subject, "KOOPIA+ Acme Inc");
    }

    #[test]
    fn whitespace_company_name_is_used_verbatim() {
        let decision = rule().decide(MEETING_SUBJECT, Some("   "), DEFAULT_OVERSIGHT_ADDRESS);
        assert_eq!(decision.resolved_company_name, "   ");
        assert_eq!(decision.final_subject, "KOOPIA+    ");
    }

    #[test]
    fn fallback_literal_when_subject_has_no_pattern() {
        let decision = rule().decide("Hello there", None, DEFAULT_OVERSIGHT_ADDRESS);
        assert_eq!(decision.resolved_company_name, FALLBACK_COMPANY_NAME);
        assert_eq!(decision.final_subject, "KOOPIA+ ETTEVÕTTE NIMI");
    }

    #[test]
    fn trigger_is_case_insensitive() {
        let shouty = DEFAULT_OVERSIGHT_ADDRESS.to_uppercase();
        let decision = rule().decide("Hello", None, &shouty);
        assert!(decision.final_subject.starts_with(ANNOTATION_PREFIX));
    }

    #[test]
    fn trigger_scans_joined_recipient_blob() {
        let blob = format!("a@x.com;b@y.com;{DEFAULT_OVERSIGHT_ADDRESS};c@z.com");
        assert!(rule().is_triggered(&blob));
        assert!(!rule().is_triggered("a@x.com;b@y.com"));
    }

    #[test]
    fn trigger_matches_inside_display_name_form() {
        let blob = format!("Koopia <{DEFAULT_OVERSIGHT_ADDRESS}>");
        assert!(rule().is_triggered(&blob));
    }

    #[test]
    fn subject_without_date_suffix() {
        let r = rule();
        assert_eq!(
            r.company_from_subject("Kohtumine: Meie ja Teie Firma AS").as_deref(),
            Some("Teie Firma AS")
        );
    }

    #[test]
    fn subject_with_empty_second_party_falls_back() {
        let decision = rule().decide("Kohtumine: Meie ja  ", None, DEFAULT_OVERSIGHT_ADDRESS);
        assert_eq!(decision.resolved_company_name, FALLBACK_COMPANY_NAME);
    }

    #[test]
    fn custom_oversight_address() {
        let r = AnnotationRule::new("Audit@Example.com");
        assert_eq!(r.oversight_address(), "audit@example.com");
        assert!(r.is_triggered("boss@example.com, audit@EXAMPLE.com"));
        assert!(!r.is_triggered(DEFAULT_OVERSIGHT_ADDRESS));
    }
}
