//! Text Extractor — turns uploaded PDF/DOCX bytes into plain text.
//!
//! `extract` never fails: a corrupt or unreadable file yields empty text so that one
//! bad upload cannot abort the rest of the batch.

pub mod docx;
pub mod normalize;
pub mod ocr;
pub mod pdf;

use thiserror::Error;
use tracing::{info, warn};

use crate::extraction::ocr::OcrSettings;
use crate::models::screening::{ExtractedText, MimeKind, ResumeDocument};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF could not be read: {0}")]
    Pdf(String),

    #[error("DOCX could not be read: {0}")]
    Docx(String),

    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub ocr_enabled: bool,
    /// Pages with fewer non-whitespace characters than this are re-read with OCR.
    pub low_char_threshold: usize,
    pub ocr: OcrSettings,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            ocr_enabled: true,
            low_char_threshold: 200,
            ocr: OcrSettings::default(),
        }
    }
}

/// Extracts plain text from one resume.
pub async fn extract(document: ResumeDocument, settings: &ExtractionSettings) -> ExtractedText {
    let ResumeDocument {
        filename,
        raw_bytes,
        mime_kind,
    } = document;

    let outcome = match mime_kind {
        MimeKind::Pdf => pdf::extract_pdf(raw_bytes, settings).await,
        MimeKind::Docx => tokio::task::spawn_blocking(move || docx::extract_docx(&raw_bytes))
            .await
            .map_err(ExtractionError::from)
            .and_then(|r| r.map(|text| (text, false))),
    };

    match outcome {
        Ok((text, used_ocr)) => {
            info!(
                "Extracted {} chars from {filename} ({}{})",
                text.chars().count(),
                mime_kind.as_str(),
                if used_ocr { ", OCR" } else { "" }
            );
            ExtractedText {
                filename,
                text,
                used_ocr,
            }
        }
        Err(e) => {
            warn!("Extraction failed for {filename}: {e}");
            ExtractedText::empty(filename)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ExtractionSettings {
        ExtractionSettings {
            ocr_enabled: false,
            ..ExtractionSettings::default()
        }
    }

    #[tokio::test]
    async fn test_docx_extraction_has_no_ocr() {
        let bytes = docx::fixtures::docx_bytes(&["Jane Doe", "Rust, Tokio, Axum"], &[]);
        let doc = ResumeDocument::new("jane.docx", bytes, MimeKind::Docx);
        let extracted = extract(doc, &settings()).await;
        assert_eq!(extracted.filename, "jane.docx");
        assert!(extracted.text.contains("Rust, Tokio, Axum"));
        assert!(!extracted.used_ocr);
    }

    #[tokio::test]
    async fn test_pdf_extraction() {
        let bytes = pdf::fixtures::text_pdf(&["John Smith Backend Engineer"]);
        let doc = ResumeDocument::new("john.pdf", bytes, MimeKind::Pdf);
        let extracted = extract(doc, &settings()).await;
        assert!(extracted.text.contains("John Smith Backend Engineer"));
        assert!(extracted.has_signal());
    }

    #[tokio::test]
    async fn test_corrupt_pdf_degrades_to_empty_text() {
        let doc = ResumeDocument::new("broken.pdf", b"%PDF-garbage".to_vec(), MimeKind::Pdf);
        let extracted = extract(doc, &settings()).await;
        assert_eq!(extracted, ExtractedText::empty("broken.pdf"));
    }

    #[tokio::test]
    async fn test_pdf_bytes_labelled_docx_degrade_to_empty_text() {
        let bytes = pdf::fixtures::text_pdf(&["Not a docx"]);
        let doc = ResumeDocument::new("mislabelled.docx", bytes, MimeKind::Docx);
        let extracted = extract(doc, &settings()).await;
        assert!(extracted.text.is_empty());
        assert!(!extracted.used_ocr);
    }
}
