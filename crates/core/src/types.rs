use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Characters allowed in owner and site identifiers.
///
/// Restricting ids to URL-unreserved characters keeps addresses free of the
/// `/` separator and lets them round-trip through links without escaping.
fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

fn validate_id(kind: &str, raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(Error::InvalidId(format!("{} id is empty", kind)));
    }
    if raw == "." || raw == ".." {
        return Err(Error::InvalidId(format!("{} id '{}' is reserved", kind, raw)));
    }
    if let Some(bad) = raw.chars().find(|c| !is_id_char(*c)) {
        return Err(Error::InvalidId(format!(
            "{} id '{}' contains disallowed character {:?}",
            kind, raw, bad
        )));
    }
    Ok(())
}

/// Identifier of the authenticated account that owns a collection of sites
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        validate_id("owner", &raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque site identifier, unique within its owner's collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteId(String);

impl SiteId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        validate_id("site", &raw)?;
        Ok(Self(raw))
    }

    /// Allocate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SiteId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SiteId> for String {
    fn from(id: SiteId) -> Self {
        id.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated result of a generation request
///
/// Field names on the wire follow the generation schema (`tailwind`,
/// `mobileFirst`, `notes`, ...). `html`, `css` and `scripts` are untrusted
/// and are never interpreted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub slug: String,
    pub html: String,
    pub css: String,
    #[serde(default)]
    pub scripts: String,
    #[serde(rename = "tailwind")]
    pub tailwind_enabled: bool,
    #[serde(default)]
    pub assets: Vec<AssetPlaceholder>,
    #[serde(default)]
    pub seo: SeoMetadata,
    #[serde(default)]
    pub accessibility_notes: String,
    #[serde(default, rename = "mobileFirst")]
    pub mobile_first: bool,
    #[serde(default, rename = "notes")]
    pub author_notes: String,
    #[serde(default)]
    pub preview_instructions: String,
}

/// Placeholder for an image the generated page refers to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPlaceholder {
    #[serde(default)]
    pub path: String,
    #[serde(default, rename = "alt")]
    pub alt_text: String,
}

/// SEO metadata, every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

/// Persisted, owner-scoped container for one SiteContent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    pub id: SiteId,
    pub owner_id: OwnerId,
    pub prompt: String,
    pub content: SiteContent,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl SiteRecord {
    /// Public address of this record
    pub fn address(&self) -> crate::Address {
        crate::Address::new(self.owner_id.clone(), self.id.clone())
    }
}

/// Who is issuing a store call
///
/// The storage layer evaluates its access rules against this value; service
/// code only ever passes along the authenticated caller's own id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Account(OwnerId),
}

impl Principal {
    pub fn is_owner(&self, owner: &OwnerId) -> bool {
        matches!(self, Principal::Account(id) if id == owner)
    }
}

impl From<OwnerId> for Principal {
    fn from(owner: OwnerId) -> Self {
        Principal::Account(owner)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Anonymous => f.write_str("anonymous"),
            Principal::Account(id) => write!(f, "account:{}", id),
        }
    }
}

/// Reduce arbitrary text to a URL-safe slug
///
/// Keeps ASCII alphanumerics, maps whitespace, `-` and `_` to single hyphens
/// and drops everything else.
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
