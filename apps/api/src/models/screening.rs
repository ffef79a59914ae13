use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Document formats accepted for screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeKind {
    Pdf,
    Docx,
}

impl MimeKind {
    /// Resolves the format from the file extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(MimeKind::Pdf),
            "docx" => Some(MimeKind::Docx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeKind::Pdf => "pdf",
            MimeKind::Docx => "docx",
        }
    }
}

/// An uploaded resume. Lives only for the duration of one screening run.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub filename: String,
    pub raw_bytes: Bytes,
    pub mime_kind: MimeKind,
}

impl ResumeDocument {
    pub fn new(filename: impl Into<String>, raw_bytes: impl Into<Bytes>, mime_kind: MimeKind) -> Self {
        Self {
            filename: filename.into(),
            raw_bytes: raw_bytes.into(),
            mime_kind,
        }
    }
}

/// Plain text pulled out of a resume. `text` is empty when extraction failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedText {
    pub filename: String,
    pub text: String,
    pub used_ocr: bool,
}

impl ExtractedText {
    pub fn empty(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            text: String::new(),
            used_ocr: false,
        }
    }

    /// Empty text carries no signal and must not be scored.
    pub fn has_signal(&self) -> bool {
        self.text.chars().any(|c| !c.is_whitespace())
    }
}

/// The job description shared by every resume in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    pub text: String,
}

impl JobDescription {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A deduction the model applied for a major gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub reason: String,
    #[serde(default)]
    pub points: f64,
}

/// One scored candidate. Exactly one is produced per uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub file: String,
    pub candidate_name: Option<String>,
    pub final_score: f64, // 0 – 100
    pub hard_filter_pass: bool,
    pub explanation: String,
    /// Most important reason first.
    pub top_reasons: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    // Component scores, null when the backend gave none.
    #[serde(default)]
    pub skill_coverage: Option<f64>,
    #[serde(default)]
    pub project_relevance: Option<f64>,
    #[serde(default)]
    pub role_alignment: Option<f64>,
    #[serde(default)]
    pub education_fit: Option<f64>,
    #[serde(default)]
    pub penalties: Vec<Penalty>,
    /// Short quotes from the resume backing the score.
    #[serde(default)]
    pub evidence_snippets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_kind_from_extension_is_case_insensitive() {
        assert_eq!(MimeKind::from_filename("cv.PDF"), Some(MimeKind::Pdf));
        assert_eq!(MimeKind::from_filename("jane.doe.Docx"), Some(MimeKind::Docx));
    }

    #[test]
    fn test_mime_kind_rejects_other_extensions() {
        assert_eq!(MimeKind::from_filename("cv.doc"), None);
        assert_eq!(MimeKind::from_filename("resume"), None);
        assert_eq!(MimeKind::from_filename("notes.txt"), None);
    }

    #[test]
    fn test_whitespace_only_text_has_no_signal() {
        let mut extracted = ExtractedText::empty("a.pdf");
        assert!(!extracted.has_signal());
        extracted.text = " \n\t ".to_string();
        assert!(!extracted.has_signal());
        extracted.text = "Rust".to_string();
        assert!(extracted.has_signal());
    }

    #[test]
    fn test_score_result_risks_default_when_absent() {
        let json = r#"{
            "file": "a.pdf",
            "candidate_name": null,
            "final_score": 42.0,
            "hard_filter_pass": true,
            "explanation": "ok",
            "top_reasons": ["Rust"]
        }"#;
        let result: ScoreResult = serde_json::from_str(json).unwrap();
        assert!(result.risks.is_empty());
        assert!(result.penalties.is_empty());
        assert_eq!(result.skill_coverage, None);
        assert_eq!(result.candidate_name, None);
    }
}
