//! Cheap keyword gate run before any AI spend.

use std::sync::OnceLock;

use regex::Regex;

pub const MIN_RESUME_CHARS: usize = 100;
pub const MIN_KEYWORD_MATCHES: usize = 3;

const RESUME_KEYWORDS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "qualifications",
    "university",
    "degree",
    "certification",
    "resume",
    "résumé",
    "cv",
    "curriculum vitae",
    "objective",
    "summary",
    "career",
    "employment",
    "work history",
    "internship",
    "bachelor",
    "master",
    "professional experience",
    "references",
    "achievements",
    "projects",
];

fn keyword_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        RESUME_KEYWORDS
            .iter()
            .map(|kw| {
                let pattern = format!(r"\b{}\b", regex::escape(kw).replace(' ', r"\s+"));
                (*kw, Regex::new(&pattern).expect("valid keyword regex"))
            })
            .collect()
    })
}

/// Distinct keywords found in `text`, in keyword-table order.
pub fn matched_keywords(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    keyword_patterns()
        .iter()
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(kw, _)| *kw)
        .collect()
}

/// True when `text` is at least 100 characters and names 3+ distinct keywords.
pub fn is_likely_resume(text: &str) -> bool {
    if text.chars().count() < MIN_RESUME_CHARS {
        return false;
    }
    matched_keywords(text).len() >= MIN_KEYWORD_MATCHES
}
