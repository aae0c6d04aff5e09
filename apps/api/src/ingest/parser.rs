//! AI parsing stage: extracted text in, candidate resume JSON out.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::ingest::prompts::{RESUME_PARSE_PROMPT, RESUME_PARSE_SYSTEM};
use crate::llm_client::prompts::{INJECTION_GUARD_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{CompletionOptions, LlmClient};

/// Used when the model omits `confidence`.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const PARSE_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.1,
    max_tokens: 4000,
};

/// The model's answer split into the document and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct AiParseOutput {
    /// Candidate resume with `confidence`/`warnings` removed. Not yet validated.
    pub resume_json: Value,
    pub confidence: f64,
    pub warnings: Vec<String>,
}

/// Carried in `AppState` as `Arc<dyn ResumeParser>` so the orchestrator never
/// depends on a concrete AI backend.
#[async_trait]
pub trait ResumeParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<AiParseOutput, AppError>;
}

/// OpenAI-backed parser.
#[derive(Clone)]
pub struct AiResumeParser {
    llm: LlmClient,
    max_input_chars: usize,
}

impl AiResumeParser {
    pub fn new(llm: LlmClient, max_input_chars: usize) -> Self {
        Self {
            llm,
            max_input_chars,
        }
    }
}

#[async_trait]
impl ResumeParser for AiResumeParser {
    async fn parse(&self, text: &str) -> Result<AiParseOutput, AppError> {
        let input = truncate_chars(text, self.max_input_chars);
        if input.len() < text.len() {
            info!(
                original_chars = text.chars().count(),
                max_chars = self.max_input_chars,
                "Truncated resume text before AI parse"
            );
        }

        let system = build_system_prompt();
        let prompt = RESUME_PARSE_PROMPT.replace("{resume_text}", input);
        let payload = self.llm.call_json(&system, &prompt, PARSE_OPTIONS).await?;

        split_parse_payload(payload)
    }
}

fn build_system_prompt() -> String {
    format!("{RESUME_PARSE_SYSTEM}\n\n{INJECTION_GUARD_INSTRUCTION}\n\n{JSON_ONLY_SYSTEM}")
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Separates `confidence` and `warnings` from the resume fields.
pub fn split_parse_payload(payload: Value) -> Result<AiParseOutput, AppError> {
    let Value::Object(mut fields) = payload else {
        return Err(AppError::AiResponse(
            "model response is not a JSON object".to_string(),
        ));
    };

    let confidence = fields
        .remove("confidence")
        .and_then(|v| v.as_f64())
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let warnings = match fields.remove("warnings") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|w| match w {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(AiParseOutput {
        resume_json: Value::Object(fields),
        confidence,
        warnings,
    })
}
