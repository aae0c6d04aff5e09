use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ingest::extractor::ExtractionError;
use crate::ingest::file_validator::FileValidationError;
use crate::llm_client::LlmError;

pub const NOT_A_RESUME_MESSAGE: &str =
    "This document does not look like a resume. Please upload a resume in PDF or DOCX format.";
pub const LOW_CONFIDENCE_MESSAGE: &str =
    "Could not parse this resume with enough confidence. Please check the file and try again.";
pub const SCHEMA_MESSAGE: &str = "Parsed resume failed schema validation";

/// Application-level error type.
/// Every pipeline stage returns `Result<T, AppError>`; `IntoResponse` turns the
/// error into the failure envelope at the handler boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid file: {0}")]
    FileValidation(#[from] FileValidationError),

    #[error("Document is not a resume")]
    NotAResume,

    #[error("Low confidence parse ({confidence})")]
    LowConfidence {
        confidence: f64,
        warnings: Vec<String>,
    },

    #[error("Schema validation failed: {}", errors.join("; "))]
    Schema { errors: Vec<String> },

    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("AI service error: {0}")]
    Ai(#[from] LlmError),

    #[error("AI service error: {0}")]
    AiResponse(String),

    #[error("YAML serialization failed: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failure envelope: `{ success: false, error, validation_errors?, confidence?, warnings? }`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl ErrorEnvelope {
    fn message(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            validation_errors: None,
            confidence: None,
            warnings: None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_)
            | AppError::FileValidation(_)
            | AppError::NotAResume
            | AppError::LowConfidence { .. } => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Schema { .. }
            | AppError::Extraction(_)
            | AppError::Ai(_)
            | AppError::AiResponse(_)
            | AppError::Serialization(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            AppError::Unauthorized(msg) => ErrorEnvelope::message(format!("Unauthorized: {msg}")),
            AppError::BadRequest(msg) => ErrorEnvelope::message(msg.clone()),
            AppError::FileValidation(e) => ErrorEnvelope::message(e.to_string()),
            AppError::NotAResume => ErrorEnvelope::message(NOT_A_RESUME_MESSAGE),
            AppError::LowConfidence {
                confidence,
                warnings,
            } => ErrorEnvelope {
                confidence: Some(*confidence),
                warnings: Some(warnings.clone()),
                ..ErrorEnvelope::message(LOW_CONFIDENCE_MESSAGE)
            },
            AppError::Schema { errors } => ErrorEnvelope {
                validation_errors: Some(errors.clone()),
                ..ErrorEnvelope::message(SCHEMA_MESSAGE)
            },
            AppError::Extraction(e) => {
                ErrorEnvelope::message(format!("Failed to extract text from file: {e}"))
            }
            AppError::Ai(e) => ErrorEnvelope::message(format!("AI service error: {e}")),
            AppError::AiResponse(msg) => ErrorEnvelope::message(format!("AI service error: {msg}")),
            AppError::Serialization(e) => {
                ErrorEnvelope::message(format!("Failed to convert resume to YAML: {e}"))
            }
            AppError::MethodNotAllowed => ErrorEnvelope::message("Method not allowed"),
            AppError::Database(_) | AppError::Internal(_) => {
                ErrorEnvelope::message("Internal server error")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            AppError::Extraction(e) => tracing::error!("Extraction error: {e}"),
            AppError::Ai(e) => tracing::error!("LLM error: {e}"),
            AppError::AiResponse(msg) => tracing::error!("LLM response error: {msg}"),
            AppError::Serialization(e) => tracing::error!("YAML serialization error: {e}"),
            AppError::Schema { errors } => {
                tracing::warn!(error_count = errors.len(), "AI output failed schema validation")
            }
            other => tracing::debug!("Request rejected ({status}): {other}"),
        }

        (status, Json(self.envelope())).into_response()
    }
}
