//! OCR for image-only PDF pages: rasterise with Poppler's `pdftoppm`, read with `tesseract`.
//!
//! Both tools are external binaries. When either is missing the caller keeps whatever
//! the text layer produced; OCR is an enhancement, never a requirement.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR tool '{0}' not found on PATH")]
    ToolNotFound(String),

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{0} timed out")]
    Timeout(String),

    #[error("rasteriser produced no image for page {0}")]
    MissingImage(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings for the external OCR tools.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub lang: String,
    pub dpi: u32,
    pub timeout: Duration,
    pub pdftoppm_bin: String,
    pub tesseract_bin: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            lang: "eng".to_string(),
            dpi: 300,
            timeout: Duration::from_secs(60),
            pdftoppm_bin: "pdftoppm".to_string(),
            tesseract_bin: "tesseract".to_string(),
        }
    }
}

/// Runs OCR on single pages of a PDF already written to disk.
pub struct PageOcr<'a> {
    settings: &'a OcrSettings,
    pdf_path: &'a Path,
    scratch: &'a Path,
}

impl<'a> PageOcr<'a> {
    pub fn new(settings: &'a OcrSettings, pdf_path: &'a Path, scratch: &'a Path) -> Self {
        Self {
            settings,
            pdf_path,
            scratch,
        }
    }

    /// Returns the recognised text of a 1-based page number.
    pub async fn recognise(&self, page: u32) -> Result<String, OcrError> {
        let image = self.rasterise(page).await?;
        let image_arg = image.to_string_lossy().to_string();
        let stdout = self
            .run(
                &self.settings.tesseract_bin,
                &[
                    image_arg.as_str(),
                    "stdout",
                    "-l",
                    &self.settings.lang,
                    "--oem",
                    "1",
                    "--psm",
                    "6",
                ],
            )
            .await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    async fn rasterise(&self, page: u32) -> Result<PathBuf, OcrError> {
        let prefix = self.scratch.join(format!("page-{page}"));
        let page_arg = page.to_string();
        let dpi_arg = self.settings.dpi.to_string();
        let pdf_arg = self.pdf_path.to_string_lossy().to_string();
        let prefix_arg = prefix.to_string_lossy().to_string();

        self.run(
            &self.settings.pdftoppm_bin,
            &[
                "-f",
                &page_arg,
                "-l",
                &page_arg,
                "-r",
                &dpi_arg,
                "-png",
                "-singlefile",
                &pdf_arg,
                &prefix_arg,
            ],
        )
        .await?;

        let image = prefix.with_extension("png");
        if tokio::fs::metadata(&image).await.is_err() {
            return Err(OcrError::MissingImage(page));
        }
        Ok(image)
    }

    async fn run(&self, bin: &str, args: &[&str]) -> Result<Vec<u8>, OcrError> {
        debug!("running {bin} {}", args.join(" "));
        let child = Command::new(bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::ToolNotFound(bin.to_string()),
                _ => OcrError::Io(e),
            })?;

        let output = tokio::time::timeout(self.settings.timeout, child.wait_with_output())
            .await
            .map_err(|_| OcrError::Timeout(bin.to_string()))??;

        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: bin.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}
