//! PDF text extraction: text layer page by page, OCR for pages that come back near-empty.

use bytes::Bytes;
use lopdf::Document;
use tracing::{debug, warn};

use crate::extraction::normalize::{
    collapse_whitespace, content_chars, drop_repeating_headers, fix_hyphenation,
};
use crate::extraction::ocr::{OcrError, PageOcr};
use crate::extraction::{ExtractionError, ExtractionSettings};

const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    pub text: String,
}

/// Extracts the text of a PDF. Returns the assembled text and whether OCR replaced any page.
pub async fn extract_pdf(
    bytes: Bytes,
    settings: &ExtractionSettings,
) -> Result<(String, bool), ExtractionError> {
    let layer_bytes = bytes.clone();
    let mut pages = tokio::task::spawn_blocking(move || read_text_layer(&layer_bytes)).await??;

    let low_pages: Vec<usize> = pages
        .iter()
        .enumerate()
        .filter(|(_, p)| content_chars(&p.text) < settings.low_char_threshold)
        .map(|(idx, _)| idx)
        .collect();

    let mut used_ocr = false;
    if settings.ocr_enabled && !low_pages.is_empty() {
        debug!("{} of {} pages below text threshold", low_pages.len(), pages.len());
        used_ocr = ocr_low_pages(&bytes, &mut pages, &low_pages, settings).await;
    }

    Ok((assemble_pages(pages), used_ocr))
}

/// Reads the embedded text layer. Falls back to whole-document extraction
/// (reported as a single page) when the page tree cannot be parsed.
pub fn read_text_layer(bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
    let document = match Document::load_mem(bytes) {
        Ok(document) => document,
        Err(load_error) => {
            debug!("lopdf could not open document ({load_error}); trying pdf-extract");
            let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
                ExtractionError::Pdf(format!("{load_error}; fallback extractor failed: {e}"))
            })?;
            return Ok(vec![PageText { number: 1, text }]);
        }
    };

    let pages = document
        .get_pages()
        .keys()
        .map(|&number| {
            // A page we cannot decode is treated as empty so it becomes an OCR candidate.
            let text = document.extract_text(&[number]).unwrap_or_else(|e| {
                debug!("page {number}: text layer unreadable ({e})");
                String::new()
            });
            PageText { number, text }
        })
        .collect::<Vec<_>>();

    if pages.is_empty() {
        return Err(ExtractionError::Pdf("document has no pages".to_string()));
    }
    Ok(pages)
}

/// Replaces low-text pages with OCR output where OCR recovers more content.
async fn ocr_low_pages(
    bytes: &[u8],
    pages: &mut [PageText],
    low_pages: &[usize],
    settings: &ExtractionSettings,
) -> bool {
    let scratch = match tempfile::Builder::new().prefix("screener-ocr-").tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!("OCR skipped: cannot create scratch directory: {e}");
            return false;
        }
    };
    let pdf_path = scratch.path().join("input.pdf");
    if let Err(e) = tokio::fs::write(&pdf_path, bytes).await {
        warn!("OCR skipped: cannot write scratch PDF: {e}");
        return false;
    }

    let ocr = PageOcr::new(&settings.ocr, &pdf_path, scratch.path());
    let mut replaced_any = false;

    for &idx in low_pages {
        let page = &mut pages[idx];
        match ocr.recognise(page.number).await {
            Ok(text) if content_chars(&text) > content_chars(&page.text) => {
                debug!("page {}: OCR recovered {} chars", page.number, content_chars(&text));
                page.text = text;
                replaced_any = true;
            }
            Ok(_) => debug!("page {}: OCR found nothing better than the text layer", page.number),
            Err(e @ OcrError::ToolNotFound(_)) => {
                warn!("OCR unavailable, keeping text layer: {e}");
                break;
            }
            Err(e) => warn!("page {}: OCR failed: {e}", page.number),
        }
    }

    replaced_any
}

/// Header/footer removal, hyphenation repair and whitespace collapse, then pages
/// joined in document order.
pub fn assemble_pages(pages: Vec<PageText>) -> String {
    let texts = drop_repeating_headers(pages.into_iter().map(|p| p.text).collect());
    texts
        .iter()
        .map(|t| collapse_whitespace(&fix_hyphenation(t)))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn no_ocr() -> ExtractionSettings {
        ExtractionSettings {
            ocr_enabled: false,
            ..ExtractionSettings::default()
        }
    }

    #[test]
    fn test_text_layer_is_read_page_by_page() {
        let pdf = fixtures::text_pdf(&["Jane Doe Rust Engineer", "Kubernetes and Kafka"]);
        let pages = read_text_layer(&pdf).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("Jane Doe Rust Engineer"));
        assert!(pages[1].text.contains("Kubernetes and Kafka"));
    }

    #[test]
    fn test_garbage_bytes_are_a_pdf_error() {
        let err = read_text_layer(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[tokio::test]
    async fn test_pages_joined_in_order_with_separator() {
        let pdf = fixtures::text_pdf(&["First page text", "Second page text"]);
        let (text, used_ocr) = extract_pdf(Bytes::from(pdf), &no_ocr()).await.unwrap();
        assert!(!used_ocr);
        let first = text.find("First page text").unwrap();
        let second = text.find("Second page text").unwrap();
        assert!(first < second);
        assert!(text.contains(PAGE_SEPARATOR));
    }

    #[tokio::test]
    async fn test_low_text_page_keeps_layer_when_ocr_tools_missing() {
        let mut settings = ExtractionSettings::default();
        settings.ocr.pdftoppm_bin = "no-such-pdftoppm-binary".to_string();
        let pdf = fixtures::text_pdf(&["Short page"]);
        let (text, used_ocr) = extract_pdf(Bytes::from(pdf), &settings).await.unwrap();
        assert!(!used_ocr);
        assert!(text.contains("Short page"));
    }

    #[cfg(unix)]
    fn write_script(dir: &std::path::Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_low_text_pages_are_replaced_by_ocr_output() {
        let tools = tempfile::tempdir().unwrap();
        // pdftoppm writes `<prefix>.png`; the prefix is its last argument.
        let pdftoppm = write_script(
            tools.path(),
            "pdftoppm",
            r#"for arg; do prefix="$arg"; done; : > "$prefix.png""#,
        );
        let tesseract = write_script(
            tools.path(),
            "tesseract",
            r#"echo "Recovered $(basename "$1" .png) Senior Rust engineer building distributed storage, Kafka pipelines and Kubernetes operators for payment systems over six years of production work""#,
        );

        let mut settings = ExtractionSettings::default();
        settings.ocr_enabled = true;
        settings.ocr.pdftoppm_bin = pdftoppm;
        settings.ocr.tesseract_bin = tesseract;

        let pdf = fixtures::text_pdf(&["Scan 1", "Scan 2"]);
        let (text, used_ocr) = extract_pdf(Bytes::from(pdf), &settings).await.unwrap();

        assert!(used_ocr);
        let first = text.find("Recovered page-1").unwrap();
        let second = text.find("Recovered page-2").unwrap();
        assert!(first < second);
        assert!(text.contains("Kafka pipelines"));
        assert!(!text.contains("Scan 1"));
    }

    #[test]
    fn test_assemble_skips_empty_pages() {
        let pages = vec![
            PageText { number: 1, text: "  Alpha  ".to_string() },
            PageText { number: 2, text: "   ".to_string() },
            PageText { number: 3, text: "Beta".to_string() },
        ];
        assert_eq!(assemble_pages(pages), "Alpha\n\nBeta");
    }
}
