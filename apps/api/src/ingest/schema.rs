//! Structural validation of AI output.
//!
//! `decode_resume` is a discriminated-union decoder: it walks the candidate
//! JSON once, builds the typed `ParsedResume` when everything checks out, and
//! otherwise reports every violation with an indexed path. It never stops at
//! the first problem and never repairs the input.
//!
//! Keys the typed model does not know are dropped from the decoded document
//! and logged at debug level.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::resume::{
    CertificationItem, ContactInfo, EducationItem, ExperienceItem, ParsedResume, Section,
    SectionContent, SocialLink,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    /// The typed document, present exactly when `valid`.
    #[serde(skip)]
    pub resume: Option<ParsedResume>,
}

/// Pure and idempotent; all problems land in `errors`.
pub fn validate_resume_schema(candidate: &Value) -> ValidationResult {
    match decode_resume(candidate) {
        Ok(resume) => ValidationResult {
            valid: true,
            errors: Vec::new(),
            resume: Some(resume),
        },
        Err(errors) => ValidationResult {
            valid: false,
            errors,
            resume: None,
        },
    }
}

pub fn decode_resume(candidate: &Value) -> Result<ParsedResume, Vec<String>> {
    let Some(root) = candidate.as_object() else {
        return Err(vec!["resume must be an object".to_string()]);
    };

    let mut errors = Vec::new();
    log_unmodeled_keys(root, &["contact_info", "sections"], "resume");

    let contact_info = match present(root, "contact_info") {
        Some(value) => decode_contact_info(value, &mut errors),
        None => {
            errors.push("missing 'contact_info'".to_string());
            None
        }
    };

    let sections = match present(root, "sections") {
        Some(value) => decode_sections(value, &mut errors),
        None => {
            errors.push("missing 'sections'".to_string());
            None
        }
    };

    match (contact_info, sections) {
        (Some(contact_info), Some(sections)) if errors.is_empty() => Ok(ParsedResume {
            contact_info,
            sections,
        }),
        _ => Err(errors),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field helpers
// ────────────────────────────────────────────────────────────────────────────

/// A key counts as present only when it holds a non-null value.
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn non_empty_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn required_str(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<String>,
) -> Option<String> {
    let value = non_empty_str(obj, key);
    if value.is_none() {
        errors.push(format!("{path}: missing or invalid '{key}'"));
    }
    value
}

fn optional_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    non_empty_str(obj, key)
}

/// Logs keys of `obj` outside `known`; they do not reach the YAML.
fn log_unmodeled_keys(obj: &Map<String, Value>, known: &[&str], path: &str) {
    let dropped: Vec<&str> = obj
        .keys()
        .map(String::as_str)
        .filter(|key| !known.contains(key))
        .collect();
    if !dropped.is_empty() {
        debug!(path, ?dropped, "Dropping fields outside the resume schema");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// contact_info
// ────────────────────────────────────────────────────────────────────────────

fn decode_contact_info(value: &Value, errors: &mut Vec<String>) -> Option<ContactInfo> {
    let Some(obj) = value.as_object() else {
        errors.push("contact_info must be an object".to_string());
        return None;
    };

    let path = "contact_info";
    log_unmodeled_keys(
        obj,
        &["name", "location", "email", "phone", "social_links"],
        path,
    );
    let name = required_str(obj, "name", path, errors);
    let location = required_str(obj, "location", path, errors);
    let email = required_str(obj, "email", path, errors);
    let phone = required_str(obj, "phone", path, errors);

    let email = email.and_then(|email| {
        if email.contains('@') {
            Some(email)
        } else {
            errors.push("contact_info: 'email' must contain '@'".to_string());
            None
        }
    });

    let social_links = match present(obj, "social_links") {
        None => Some(None),
        Some(links) => decode_social_links(links, errors).map(Some),
    };

    Some(ContactInfo {
        name: name?,
        location: location?,
        email: email?,
        phone: phone?,
        social_links: social_links?,
    })
}

fn decode_social_links(value: &Value, errors: &mut Vec<String>) -> Option<Vec<SocialLink>> {
    let Some(items) = value.as_array() else {
        errors.push("contact_info.social_links must be an array".to_string());
        return None;
    };

    let mut links = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        let path = format!("contact_info.social_links[{i}]");
        let Some(obj) = item.as_object() else {
            errors.push(format!("{path}: item must be an object"));
            ok = false;
            continue;
        };
        log_unmodeled_keys(obj, &["platform", "url", "icon"], &path);
        let platform = required_str(obj, "platform", &path, errors);
        let url = required_str(obj, "url", &path, errors);
        match (platform, url) {
            (Some(platform), Some(url)) => links.push(SocialLink {
                platform,
                url,
                icon: optional_str(obj, "icon"),
            }),
            _ => ok = false,
        }
    }

    ok.then_some(links)
}

// ────────────────────────────────────────────────────────────────────────────
// sections
// ────────────────────────────────────────────────────────────────────────────

fn decode_sections(value: &Value, errors: &mut Vec<String>) -> Option<Vec<Section>> {
    let Some(items) = value.as_array() else {
        errors.push("sections must be an array".to_string());
        return None;
    };

    let mut sections = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        match decode_section(i, item, errors) {
            Some(section) => sections.push(section),
            None => ok = false,
        }
    }

    ok.then_some(sections)
}

fn decode_section(index: usize, value: &Value, errors: &mut Vec<String>) -> Option<Section> {
    let path = format!("sections[{index}]");
    let Some(obj) = value.as_object() else {
        errors.push(format!("{path}: section must be an object"));
        return None;
    };

    log_unmodeled_keys(obj, &["name", "type", "content"], &path);
    let name = required_str(obj, "name", &path, errors);

    let section_type = match obj.get("type").and_then(Value::as_str) {
        Some(t) if SectionContent::TYPES.contains(&t) => Some(t),
        Some(t) => {
            errors.push(format!("{path}: invalid section type '{t}'"));
            None
        }
        None => {
            errors.push(format!("{path}: missing 'type'"));
            None
        }
    };

    let content = match present(obj, "content") {
        Some(content) => content,
        None => {
            errors.push(format!("{path}: missing 'content'"));
            return None;
        }
    };

    let content = decode_content(section_type?, content, &path, errors)?;
    Some(Section {
        name: name?,
        content,
    })
}

fn decode_content(
    section_type: &str,
    content: &Value,
    path: &str,
    errors: &mut Vec<String>,
) -> Option<SectionContent> {
    if section_type == "text" {
        return match content.as_str() {
            Some(text) => Some(SectionContent::Text(text.to_string())),
            None => {
                errors.push(format!("{path}: content must be a string"));
                None
            }
        };
    }

    let Some(items) = content.as_array() else {
        errors.push(format!("{path}: content must be an array"));
        return None;
    };

    match section_type {
        "bulleted-list" => Some(SectionContent::BulletedList(items.clone())),
        "inline-list" => Some(SectionContent::InlineList(items.clone())),
        "dynamic-column-list" => Some(SectionContent::DynamicColumnList(items.clone())),
        "experience" => {
            decode_items(items, path, errors, decode_experience).map(SectionContent::Experience)
        }
        "education" => {
            decode_items(items, path, errors, decode_education).map(SectionContent::Education)
        }
        "icon-list" => {
            decode_items(items, path, errors, decode_certification).map(SectionContent::IconList)
        }
        _ => None,
    }
}

/// Decodes every record, collecting errors from all of them.
fn decode_items<T>(
    items: &[Value],
    path: &str,
    errors: &mut Vec<String>,
    decode: fn(&Map<String, Value>, &str, &mut Vec<String>) -> Option<T>,
) -> Option<Vec<T>> {
    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for (j, item) in items.iter().enumerate() {
        let item_path = format!("{path}.content[{j}]");
        let decoded = match item.as_object() {
            Some(obj) => decode(obj, &item_path, errors),
            None => {
                errors.push(format!("{item_path}: item must be an object"));
                None
            }
        };
        match decoded {
            Some(record) => out.push(record),
            None => ok = false,
        }
    }
    ok.then_some(out)
}

fn decode_experience(
    obj: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<String>,
) -> Option<ExperienceItem> {
    log_unmodeled_keys(
        obj,
        &["company", "title", "dates", "location", "description", "icon"],
        path,
    );
    let company = required_str(obj, "company", path, errors);
    let title = required_str(obj, "title", path, errors);
    let dates = required_str(obj, "dates", path, errors);
    let description = match obj.get("description").and_then(Value::as_array) {
        Some(lines) => Some(lines.clone()),
        None => {
            errors.push(format!("{path}: 'description' must be an array"));
            None
        }
    };

    Some(ExperienceItem {
        company: company?,
        title: title?,
        dates: dates?,
        location: optional_str(obj, "location"),
        description: description?,
        icon: optional_str(obj, "icon"),
    })
}

fn decode_education(
    obj: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<String>,
) -> Option<EducationItem> {
    log_unmodeled_keys(obj, &["degree", "school", "year", "location", "icon"], path);
    let degree = required_str(obj, "degree", path, errors);
    let school = required_str(obj, "school", path, errors);
    let year = required_str(obj, "year", path, errors);

    Some(EducationItem {
        degree: degree?,
        school: school?,
        year: year?,
        location: optional_str(obj, "location"),
        icon: optional_str(obj, "icon"),
    })
}

fn decode_certification(
    obj: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<String>,
) -> Option<CertificationItem> {
    log_unmodeled_keys(obj, &["certification", "issuer", "date", "icon"], path);
    let certification = required_str(obj, "certification", path, errors);
    let issuer = required_str(obj, "issuer", path, errors);
    let date = required_str(obj, "date", path, errors);

    Some(CertificationItem {
        certification: certification?,
        issuer: issuer?,
        date: date?,
        icon: optional_str(obj, "icon"),
    })
}
