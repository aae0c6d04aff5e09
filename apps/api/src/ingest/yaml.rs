//! Canonical YAML rendering of a validated resume.
//!
//! The typed model carries no `confidence`/`warnings`, so those never reach
//! the document; they travel in the response envelope instead. The output is
//! narrower than the model's JSON: only modeled fields are emitted, and any
//! extra keys were already dropped (and logged) by the schema decoder.

use crate::models::resume::ParsedResume;

/// Block-style YAML with a fixed field order. Identical input yields
/// byte-identical output.
pub fn to_yaml(resume: &ParsedResume) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(resume)
}
