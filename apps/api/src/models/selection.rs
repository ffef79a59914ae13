use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A reviewer decision about one candidate, stored independently of any screening run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub file: String,
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default)]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub hard_filter_pass: bool,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub top_reasons: Vec<String>,
    #[serde(default)]
    pub manually_selected: bool,
    #[serde(default)]
    pub manual_reason: Option<String>,
}

/// Upsert key: the file name plus the candidate name when one is known.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionKey {
    pub file: String,
    pub candidate_key: String,
}

impl SelectionRecord {
    pub fn key(&self) -> SelectionKey {
        SelectionKey {
            file: self.file.clone(),
            candidate_key: self.candidate_name.clone().unwrap_or_default(),
        }
    }

    /// Drops a manual reason that has no selection behind it and
    /// normalises blank reasons to null.
    pub fn sanitized(mut self) -> Self {
        self.manual_reason = if self.manually_selected {
            self.manual_reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
        } else {
            None
        };
        self
    }
}

/// Columns of the `selections` table that map back to a record.
#[derive(Debug, Clone, FromRow)]
pub struct SelectionRow {
    pub file: String,
    pub candidate_name: Option<String>,
    pub final_score: Option<f64>,
    pub hard_filter_pass: bool,
    pub explanation: Option<String>,
    pub top_reasons: Vec<String>,
    pub manually_selected: bool,
    pub manual_reason: Option<String>,
}

impl From<SelectionRow> for SelectionRecord {
    fn from(row: SelectionRow) -> Self {
        SelectionRecord {
            file: row.file,
            candidate_name: row.candidate_name,
            final_score: row.final_score,
            hard_filter_pass: row.hard_filter_pass,
            explanation: row.explanation,
            top_reasons: row.top_reasons,
            manually_selected: row.manually_selected,
            manual_reason: row.manual_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(selected: bool, reason: Option<&str>) -> SelectionRecord {
        SelectionRecord {
            file: "jane.pdf".to_string(),
            candidate_name: Some("Jane Doe".to_string()),
            final_score: Some(81.0),
            hard_filter_pass: true,
            explanation: Some("Strong Rust background".to_string()),
            top_reasons: vec!["Rust".to_string()],
            manually_selected: selected,
            manual_reason: reason.map(String::from),
        }
    }

    #[test]
    fn test_unselected_record_loses_its_reason() {
        let clean = record(false, Some("looked good")).sanitized();
        assert!(!clean.manually_selected);
        assert_eq!(clean.manual_reason, None);
    }

    #[test]
    fn test_selected_record_keeps_trimmed_reason() {
        let clean = record(true, Some("  referral  ")).sanitized();
        assert_eq!(clean.manual_reason.as_deref(), Some("referral"));
    }

    #[test]
    fn test_blank_reason_becomes_null() {
        let clean = record(true, Some("   ")).sanitized();
        assert_eq!(clean.manual_reason, None);
    }

    #[test]
    fn test_key_uses_empty_candidate_when_name_missing() {
        let mut r = record(false, None);
        r.candidate_name = None;
        assert_eq!(r.key().candidate_key, "");
        assert_eq!(r.key().file, "jane.pdf");
    }

    #[test]
    fn test_native_booleans_on_the_wire() {
        let json = r#"[{"file": "a.docx", "hard_filter_pass": true, "manually_selected": true, "manual_reason": "x"}]"#;
        let parsed: Vec<SelectionRecord> = serde_json::from_str(json).unwrap();
        assert!(parsed[0].hard_filter_pass);
        assert!(parsed[0].manually_selected);
        assert!(parsed[0].top_reasons.is_empty());

        // Stringified booleans are a client bug, not an accepted encoding.
        let stringly = r#"[{"file": "a.docx", "manually_selected": "Yes"}]"#;
        assert!(serde_json::from_str::<Vec<SelectionRecord>>(stringly).is_err());
    }
}
