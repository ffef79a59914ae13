//! Upload session — the batch of files a reviewer is about to screen.
//!
//! Immutable: every operation returns a new session, so nothing shares a mutable file list.

use thiserror::Error;

use crate::models::screening::{MimeKind, ResumeDocument};

/// Most files accepted in one screening run.
pub const MAX_FILES: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("at most {MAX_FILES} files can be screened at once")]
    TooManyFiles,

    #[error("'{0}' is not a .pdf or .docx file")]
    UnsupportedType(String),

    #[error("'{filename}' is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },

    #[error("'{0}' is empty")]
    EmptyFile(String),

    #[error("a file name is required")]
    MissingName,

    #[error("'{0}' was uploaded more than once; file names must be unique")]
    DuplicateName(String),
}

#[derive(Debug, Clone, Default)]
pub struct UploadSession {
    documents: Vec<ResumeDocument>,
    max_file_bytes: usize,
}

impl UploadSession {
    pub fn new(max_file_bytes: usize) -> Self {
        Self {
            documents: Vec::new(),
            max_file_bytes,
        }
    }

    /// Adds a file. Names are unique within a session; `remove` first to replace one.
    pub fn add(&self, filename: &str, bytes: impl Into<bytes::Bytes>) -> Result<Self, SessionError> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(SessionError::MissingName);
        }
        let mime_kind = MimeKind::from_filename(filename)
            .ok_or_else(|| SessionError::UnsupportedType(filename.to_string()))?;

        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SessionError::EmptyFile(filename.to_string()));
        }
        if bytes.len() > self.max_file_bytes {
            return Err(SessionError::FileTooLarge {
                filename: filename.to_string(),
                size: bytes.len(),
                limit: self.max_file_bytes,
            });
        }

        if self.documents.iter().any(|d| d.filename == filename) {
            return Err(SessionError::DuplicateName(filename.to_string()));
        }
        if self.documents.len() >= MAX_FILES {
            return Err(SessionError::TooManyFiles);
        }

        let mut documents = self.documents.clone();
        documents.push(ResumeDocument::new(filename, bytes, mime_kind));

        Ok(Self {
            documents,
            max_file_bytes: self.max_file_bytes,
        })
    }

    pub fn remove(&self, filename: &str) -> Self {
        Self {
            documents: self
                .documents
                .iter()
                .filter(|d| d.filename != filename)
                .cloned()
                .collect(),
            max_file_bytes: self.max_file_bytes,
        }
    }

    pub fn clear(&self) -> Self {
        Self::new(self.max_file_bytes)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.filename.as_str()).collect()
    }

    /// Hands the batch over for screening, in upload order.
    pub fn into_documents(self) -> Vec<ResumeDocument> {
        self.documents
    }
}
