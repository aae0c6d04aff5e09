use serde::Serialize;
use serde_json::Value;

/// The resume document exchanged with the editor.
/// Field order here is the field order of the emitted YAML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedResume {
    pub contact_info: ContactInfo,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactInfo {
    pub name: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<Vec<SocialLink>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    #[serde(flatten)]
    pub content: SectionContent,
}

/// One variant per section type, serialized as `type` + `content`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "kebab-case")]
pub enum SectionContent {
    Text(String),
    BulletedList(Vec<Value>),
    InlineList(Vec<Value>),
    DynamicColumnList(Vec<Value>),
    IconList(Vec<CertificationItem>),
    Experience(Vec<ExperienceItem>),
    Education(Vec<EducationItem>),
}

impl SectionContent {
    pub const TYPES: [&'static str; 7] = [
        "text",
        "bulleted-list",
        "inline-list",
        "dynamic-column-list",
        "icon-list",
        "experience",
        "education",
    ];

    pub fn type_str(&self) -> &'static str {
        match self {
            SectionContent::Text(_) => "text",
            SectionContent::BulletedList(_) => "bulleted-list",
            SectionContent::InlineList(_) => "inline-list",
            SectionContent::DynamicColumnList(_) => "dynamic-column-list",
            SectionContent::IconList(_) => "icon-list",
            SectionContent::Experience(_) => "experience",
            SectionContent::Education(_) => "education",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperienceItem {
    pub company: String,
    pub title: String,
    pub dates: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub description: Vec<Value>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationItem {
    pub degree: String,
    pub school: String,
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificationItem {
    pub certification: String,
    pub issuer: String,
    pub date: String,
    pub icon: Option<String>,
}
