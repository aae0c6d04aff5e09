//! Parse-result cache keyed by the SHA-256 of the uploaded bytes.
//!
//! Rows are insert-only. Concurrent first uploads of the same file race on the
//! unique `file_hash` index; the loser sees `InsertOutcome::AlreadyCached`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

/// Lower-case hex SHA-256 of `bytes` (64 chars).
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// A cached parse, as read back on a hit.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CacheEntry {
    pub file_hash: String,
    pub parsed_yaml: String,
    pub confidence_score: f64,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Everything persisted for a fresh parse.
#[derive(Debug, Clone)]
pub struct NewCacheEntry {
    pub file_hash: String,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub raw_text: String,
    pub parsed_yaml: String,
    pub parsed_json: Value,
    pub confidence_score: f64,
    pub warnings: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another request stored this hash first.
    AlreadyCached,
}

#[async_trait]
pub trait ResumeCache: Send + Sync {
    /// Unexpired entry for `file_hash`, if any.
    async fn find(&self, file_hash: &str) -> Result<Option<CacheEntry>, AppError>;

    async fn insert(&self, entry: &NewCacheEntry) -> Result<InsertOutcome, AppError>;
}

/// `parsed_resumes` table in Postgres.
#[derive(Clone)]
pub struct PgResumeCache {
    pool: PgPool,
}

impl PgResumeCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeCache for PgResumeCache {
    async fn find(&self, file_hash: &str) -> Result<Option<CacheEntry>, AppError> {
        let entry = sqlx::query_as::<_, CacheEntry>(
            r#"
            SELECT file_hash, parsed_yaml, confidence_score, warnings, created_at, expires_at
            FROM parsed_resumes
            WHERE file_hash = $1 AND expires_at > NOW()
            "#,
        )
        .bind(file_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn insert(&self, entry: &NewCacheEntry) -> Result<InsertOutcome, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO parsed_resumes
                (file_hash, user_id, file_name, file_size, file_type, raw_text,
                 parsed_yaml, parsed_json, confidence_score, warnings, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&entry.file_hash)
        .bind(entry.user_id)
        .bind(&entry.file_name)
        .bind(entry.file_size)
        .bind(&entry.file_type)
        .bind(&entry.raw_text)
        .bind(&entry.parsed_yaml)
        .bind(&entry.parsed_json)
        .bind(entry.confidence_score)
        .bind(&entry.warnings)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(file_hash = %entry.file_hash, "Cached parsed resume");
                Ok(InsertOutcome::Inserted)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::AlreadyCached)
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_64_lowercase_hex() {
        let hash = content_hash(b"resume bytes");
        assert_eq!(hash.len(), 64);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_is_deterministic() {
        let bytes = b"%PDF-1.7 identical upload".to_vec();
        assert_eq!(content_hash(&bytes), content_hash(&bytes.clone()));
    }

    #[test]
    fn test_single_bit_flip_changes_hash() {
        let original = b"%PDF-1.7 some resume".to_vec();
        let base = content_hash(&original);
        for byte in 0..original.len() {
            for bit in 0..8 {
                let mut flipped = original.clone();
                flipped[byte] ^= 1 << bit;
                assert_ne!(content_hash(&flipped), base);
            }
        }
    }
}
