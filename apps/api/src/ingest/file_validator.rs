//! Upload inspection: size cap, MIME whitelist, and magic-number check.
//!
//! The declared MIME type is never trusted on its own. A file is only
//! classified when its leading bytes carry the signature of that type.

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// `%PDF`
const PDF_SIGNATURE: &[u8] = &[0x25, 0x50, 0x44, 0x46];
/// `PK`, the ZIP local-file header. DOCX is a ZIP container.
const DOCX_SIGNATURE: &[u8] = &[0x50, 0x4B];

/// A file as received from the multipart body. Lives for one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: String,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
}

impl FileType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case(PDF_MIME) {
            Some(FileType::Pdf)
        } else if essence.eq_ignore_ascii_case(DOCX_MIME) {
            Some(FileType::Docx)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
        }
    }

    fn signature(&self) -> &'static [u8] {
        match self {
            FileType::Pdf => PDF_SIGNATURE,
            FileType::Docx => DOCX_SIGNATURE,
        }
    }
}

/// Result of a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileClassification {
    pub file_type: FileType,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileValidationError {
    #[error("File is empty")]
    Empty,

    #[error("File too large: {size} bytes (maximum is {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Unsupported file type '{0}'. Please upload a PDF or DOCX file.")]
    UnsupportedType(String),

    #[error("File content does not match declared type '{declared}'")]
    SignatureMismatch { declared: String },
}

/// Rejects files over `max_size`. Split out so the orchestrator can apply it
/// before hashing.
pub fn check_size(size: usize, max_size: usize) -> Result<(), FileValidationError> {
    if size == 0 {
        return Err(FileValidationError::Empty);
    }
    if size > max_size {
        return Err(FileValidationError::TooLarge {
            size,
            max: max_size,
        });
    }
    Ok(())
}

/// Classifies an upload as PDF or DOCX, or rejects it.
pub fn validate_file(
    file: &UploadedFile,
    max_size: usize,
) -> Result<FileClassification, FileValidationError> {
    check_size(file.size(), max_size)?;

    let file_type = FileType::from_mime(&file.mime_type)
        .ok_or_else(|| FileValidationError::UnsupportedType(file.mime_type.clone()))?;

    if !file.bytes.starts_with(file_type.signature()) {
        return Err(FileValidationError::SignatureMismatch {
            declared: file_type.as_str().to_string(),
        });
    }

    Ok(FileClassification { file_type })
}
