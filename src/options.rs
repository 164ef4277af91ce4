//! Run parameters sent with `POST /run`.
//!
//! The header text is the only option that gates the launch: it is held as a
//! [`Draft`], a draft value paired with the copy the user last confirmed.
//! Editing the draft drops the confirmation, so a job can never be started
//! with a half-typed or stale header.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A draft string together with its last explicit confirmation.
///
/// The fields are private: the only way to obtain a confirmed value is
/// [`confirm`](Draft::confirm), and every [`edit`](Draft::edit) revokes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    draft: String,
    confirmed: Option<String>,
}

impl Draft {
    pub fn edit(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.confirmed = None;
    }

    /// Confirms the trimmed draft. Confirming the same draft twice yields the
    /// same value.
    pub fn confirm(&mut self) -> Result<&str, ValidationError> {
        let trimmed = self.draft.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyHeader);
        }
        let confirmed = trimmed.to_string();
        Ok(self.confirmed.insert(confirmed).as_str())
    }

    pub fn revoke(&mut self) {
        self.confirmed = None;
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn confirmed(&self) -> Option<&str> {
        self.confirmed.as_deref()
    }
}

/// Wire form of the options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub check_schema: bool,
    pub locale: String,
    pub header_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    pub check_schema: bool,
    pub locale: String,
    header: Draft,
}

impl Default for OptionSet {
    fn default() -> Self {
        Self::new("it", false)
    }
}

impl OptionSet {
    pub fn new(locale: impl Into<String>, check_schema: bool) -> Self {
        Self {
            check_schema,
            locale: locale.into(),
            header: Draft::default(),
        }
    }

    /// Sets the header draft; any previous commit is invalidated.
    pub fn draft_header(&mut self, text: impl Into<String>) {
        self.header.edit(text);
    }

    pub fn commit_header(&mut self) -> Result<&str, ValidationError> {
        self.header.confirm()
    }

    pub fn uncommit_header(&mut self) {
        self.header.revoke();
    }

    pub fn header_draft(&self) -> &str {
        self.header.draft()
    }

    pub fn committed_header(&self) -> Option<&str> {
        self.header.confirmed()
    }

    /// The payload for `POST /run`, or `None` while the header is uncommitted.
    /// The header sent is always the committed one, never the draft.
    pub fn payload(&self) -> Option<RunOptions> {
        self.header.confirmed().map(|header| RunOptions {
            check_schema: self.check_schema,
            locale: self.locale.clone(),
            header_text: header.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_defaults() {
        let opts = OptionSet::default();
        assert_eq!(opts.locale, "it");
        assert!(!opts.check_schema);
        assert_eq!(opts.header_draft(), "");
        assert_eq!(opts.committed_header(), None);
        assert_eq!(opts.payload(), None);
    }

    #[test]
    fn commit_trims_the_draft() {
        let mut opts = OptionSet::default();
        opts.draft_header("  I.I.S. Papareschi  ");
        assert_eq!(opts.commit_header().unwrap(), "I.I.S. Papareschi");
        assert_eq!(opts.committed_header(), Some("I.I.S. Papareschi"));
        assert_eq!(opts.header_draft(), "  I.I.S. Papareschi  ");
    }

    #[test]
    fn blank_header_cannot_be_committed() {
        let mut opts = OptionSet::default();
        opts.draft_header("   \t ");
        assert_eq!(opts.commit_header(), Err(ValidationError::EmptyHeader));
        assert_eq!(opts.committed_header(), None);
    }

    #[test]
    fn editing_after_commit_clears_commitment() {
        let mut opts = OptionSet::default();
        opts.draft_header("Header X");
        opts.commit_header().unwrap();
        opts.draft_header("Header X2");
        assert_eq!(opts.committed_header(), None);
        assert_eq!(opts.payload(), None);
    }

    #[test]
    fn editing_to_same_text_still_requires_recommit() {
        let mut opts = OptionSet::default();
        opts.draft_header("Header X");
        opts.commit_header().unwrap();
        opts.draft_header("Header X");
        assert_eq!(opts.committed_header(), None);
    }

    #[test]
    fn commit_is_idempotent() {
        let mut opts = OptionSet::default();
        opts.draft_header("Header X");
        let first = opts.commit_header().unwrap().to_string();
        let second = opts.commit_header().unwrap().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn payload_carries_committed_header_and_options() {
        let mut opts = OptionSet::new("en", true);
        opts.draft_header(" Orario 2025 ");
        opts.commit_header().unwrap();
        assert_eq!(
            opts.payload(),
            Some(RunOptions {
                check_schema: true,
                locale: "en".into(),
                header_text: "Orario 2025".into(),
            })
        );
    }

    #[test]
    fn uncommit_keeps_draft() {
        let mut opts = OptionSet::default();
        opts.draft_header("Header X");
        opts.commit_header().unwrap();
        opts.uncommit_header();
        assert_eq!(opts.header_draft(), "Header X");
        assert_eq!(opts.committed_header(), None);
    }

    #[test]
    fn run_options_serialize_with_wire_names() {
        let json = serde_json::to_value(RunOptions {
            check_schema: false,
            locale: "it".into(),
            header_text: "H".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"check_schema": false, "locale": "it", "header_text": "H"})
        );
    }
}
