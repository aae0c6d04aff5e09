//! Ingestion orchestrator.
//!
//! Stage order for one upload:
//! size check → hash → cache lookup → (hit: respond) → validate → extract →
//! guard rail → AI parse → confidence check → schema decode → YAML → cache
//! insert → respond.
//!
//! Every stage returns `Result`; the first error ends the request. Nothing is
//! retried. The only tolerated failure is the cache insert, which never
//! changes what the caller receives.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::auth::AuthedUser;
use crate::config::IngestSettings;
use crate::errors::AppError;
use crate::ingest::cache::{content_hash, CacheEntry, InsertOutcome, NewCacheEntry, ResumeCache};
use crate::ingest::extractor::extract_text_blocking;
use crate::ingest::file_validator::{check_size, validate_file, UploadedFile};
use crate::ingest::guard::{is_likely_resume, matched_keywords};
use crate::ingest::parser::ResumeParser;
use crate::ingest::schema::validate_resume_schema;
use crate::ingest::yaml::to_yaml;

pub const REVIEW_DISCLAIMER: &str =
    "AI parsing may contain errors. Please review all fields carefully before saving.";

// ────────────────────────────────────────────────────────────────────────────
// Response envelope
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMessageType {
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiMessage {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub message_type: UiMessageType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Success envelope returned by the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSuccess {
    pub success: bool,
    pub yaml: String,
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
    pub ui_message: UiMessage,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// Collaborators are injected at startup; the pipeline holds no per-request state.
#[derive(Clone)]
pub struct IngestPipeline {
    parser: Arc<dyn ResumeParser>,
    cache: Arc<dyn ResumeCache>,
    settings: IngestSettings,
}

impl IngestPipeline {
    pub fn new(
        parser: Arc<dyn ResumeParser>,
        cache: Arc<dyn ResumeCache>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            parser,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    pub async fn ingest(
        &self,
        user: &AuthedUser,
        upload: UploadedFile,
    ) -> Result<IngestSuccess, AppError> {
        check_size(upload.size(), self.settings.max_file_size_bytes)?;

        let file_hash = content_hash(&upload.bytes);
        info!(
            user_id = %user.id,
            file_hash = %file_hash,
            file_name = %upload.file_name,
            size = upload.size(),
            "Resume ingestion started"
        );

        if let Some(entry) = self.cache.find(&file_hash).await? {
            info!(file_hash = %file_hash, "Cache hit");
            return Ok(self.cached_response(entry, &upload));
        }

        let classification = validate_file(&upload, self.settings.max_file_size_bytes)?;
        let file_type = classification.file_type;

        let text = extract_text_blocking(upload.bytes.clone(), file_type).await?;

        if !is_likely_resume(&text) {
            info!(
                file_hash = %file_hash,
                chars = text.chars().count(),
                keywords = ?matched_keywords(&text),
                "Rejected by resume guard rail"
            );
            return Err(AppError::NotAResume);
        }

        let parsed = self.parser.parse(&text).await?;
        info!(
            file_hash = %file_hash,
            confidence = parsed.confidence,
            warning_count = parsed.warnings.len(),
            "AI parse complete"
        );

        if parsed.confidence < self.settings.min_confidence {
            return Err(AppError::LowConfidence {
                confidence: parsed.confidence,
                warnings: parsed.warnings,
            });
        }

        let validation = validate_resume_schema(&parsed.resume_json);
        let Some(resume) = validation.resume else {
            return Err(AppError::Schema {
                errors: validation.errors,
            });
        };
        info!(
            file_hash = %file_hash,
            sections = ?resume.sections.iter().map(|s| s.content.type_str()).collect::<Vec<_>>(),
            "Schema validation passed"
        );
        let yaml = to_yaml(&resume)?;

        let warnings = self.with_disclaimer(parsed.warnings, parsed.confidence);

        let record = NewCacheEntry {
            file_hash: file_hash.clone(),
            user_id: user.id,
            file_name: upload.file_name.clone(),
            file_size: upload.size() as i64,
            file_type: file_type.as_str().to_string(),
            raw_text: text,
            parsed_yaml: yaml.clone(),
            parsed_json: parsed.resume_json,
            confidence_score: parsed.confidence,
            warnings: warnings.clone(),
            expires_at: Utc::now() + Duration::days(self.settings.cache_ttl_days),
        };
        self.persist(&record).await;

        Ok(IngestSuccess {
            success: true,
            yaml,
            confidence: parsed.confidence,
            ui_message: self.ui_message(parsed.confidence),
            warnings,
            cached: false,
            cached_at: None,
            file_info: Some(file_info(&upload)),
        })
    }

    /// Cache writes never fail the request.
    async fn persist(&self, record: &NewCacheEntry) {
        match self.cache.insert(record).await {
            Ok(InsertOutcome::Inserted) => {
                info!(file_hash = %record.file_hash, "Parse result cached");
            }
            Ok(InsertOutcome::AlreadyCached) => {
                info!(
                    file_hash = %record.file_hash,
                    "Concurrent request cached this file first; serving local result"
                );
            }
            Err(e) => {
                error!(file_hash = %record.file_hash, "Failed to cache parse result: {e}");
            }
        }
    }

    fn cached_response(&self, entry: CacheEntry, upload: &UploadedFile) -> IngestSuccess {
        let confidence = entry.confidence_score;
        IngestSuccess {
            success: true,
            yaml: entry.parsed_yaml,
            confidence,
            warnings: self.with_disclaimer(entry.warnings, confidence),
            cached: true,
            cached_at: Some(entry.created_at.to_rfc3339()),
            file_info: Some(file_info(upload)),
            ui_message: self.ui_message(confidence),
        }
    }

    fn with_disclaimer(&self, mut warnings: Vec<String>, confidence: f64) -> Vec<String> {
        if confidence < self.settings.review_confidence
            && !warnings.iter().any(|w| w == REVIEW_DISCLAIMER)
        {
            warnings.push(REVIEW_DISCLAIMER.to_string());
        }
        warnings
    }

    fn ui_message(&self, confidence: f64) -> UiMessage {
        if confidence >= self.settings.review_confidence {
            UiMessage {
                title: "Resume imported".to_string(),
                description: "Your resume was parsed successfully.".to_string(),
                message_type: UiMessageType::Success,
            }
        } else {
            warn!(confidence, "Returning lower-confidence parse for review");
            UiMessage {
                title: "Resume imported, please review".to_string(),
                description: format!(
                    "Parsed with {:.0}% confidence. Some fields may need correction.",
                    confidence * 100.0
                ),
                message_type: UiMessageType::Warning,
            }
        }
    }
}

fn file_info(upload: &UploadedFile) -> FileInfo {
    FileInfo {
        name: upload.file_name.clone(),
        size: upload.size(),
        mime_type: upload.mime_type.clone(),
    }
}
