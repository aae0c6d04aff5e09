use anyhow::{bail, Context, Result};

const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_AI_MAX_INPUT_CHARS: usize = 15_000;
const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;
const DEFAULT_REVIEW_CONFIDENCE: f64 = 0.9;
const DEFAULT_CACHE_TTL_DAYS: i64 = 30;
/// Keeps `now + ttl` far inside chrono's representable range.
const MAX_CACHE_TTL_DAYS: i64 = 36_500;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub port: u16,
    pub rust_log: String,
    pub ingest: IngestSettings,
}

/// Business thresholds for the ingestion pipeline.
/// Defaults match the values the product was tuned with.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub max_file_size_bytes: usize,
    pub ai_max_input_chars: usize,
    /// Parses strictly below this confidence are rejected.
    pub min_confidence: f64,
    /// Parses strictly below this confidence get a review disclaimer.
    pub review_confidence: f64,
    pub cache_ttl_days: i64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            ai_max_input_chars: DEFAULT_AI_MAX_INPUT_CHARS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            review_confidence: DEFAULT_REVIEW_CONFIDENCE,
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
        }
    }
}

impl IngestSettings {
    /// Rejects values that would misbehave on the request path.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CACHE_TTL_DAYS).contains(&self.cache_ttl_days) {
            bail!(
                "CACHE_TTL_DAYS must be between 1 and {MAX_CACHE_TTL_DAYS}, got {}",
                self.cache_ttl_days
            );
        }
        if self.max_file_size_bytes == 0 {
            bail!("MAX_FILE_SIZE_BYTES must be greater than 0");
        }
        if self.ai_max_input_chars == 0 {
            bail!("AI_MAX_INPUT_CHARS must be greater than 0");
        }
        for (key, value) in [
            ("MIN_CONFIDENCE", self.min_confidence),
            ("REVIEW_CONFIDENCE", self.review_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{key} must be between 0 and 1, got {value}");
            }
        }
        if self.min_confidence > self.review_confidence {
            bail!("MIN_CONFIDENCE must not exceed REVIEW_CONFIDENCE");
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let ingest = IngestSettings {
            max_file_size_bytes: parse_env("MAX_FILE_SIZE_BYTES", DEFAULT_MAX_FILE_SIZE_BYTES)?,
            ai_max_input_chars: parse_env("AI_MAX_INPUT_CHARS", DEFAULT_AI_MAX_INPUT_CHARS)?,
            min_confidence: parse_env("MIN_CONFIDENCE", DEFAULT_MIN_CONFIDENCE)?,
            review_confidence: parse_env("REVIEW_CONFIDENCE", DEFAULT_REVIEW_CONFIDENCE)?,
            cache_ttl_days: parse_env("CACHE_TTL_DAYS", DEFAULT_CACHE_TTL_DAYS)?,
        };
        ingest.validate()?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| crate::llm_client::OPENAI_API_URL.to_string()),
            supabase_url: require_env("SUPABASE_URL")?,
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ingest,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
