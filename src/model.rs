use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Label shown when a row carries no source attribution.
pub const UNKNOWN_SOURCE: &str = "Unknown";
/// Title used for rows that have no tags at all.
pub const UNTITLED: &str = "Untitled";

const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y";

/// Opaque identity of a gallery image. The table may key rows by integer or
/// by string; both are normalized to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ImageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Int(n) => Self(n.to_string()),
        })
    }
}

/// One row as returned by the query collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct RawImageRow {
    pub id: ImageId,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub source: Option<String>,
    pub gcs_url: String,
    pub created_at: DateTime<Utc>,
}

impl RawImageRow {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_deref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }
}

/// An image ready for display. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: ImageId,
    pub url: String,
    pub title: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub display_date: String,
    pub tags: Vec<String>,
    pub width: u32,
    pub height: u32,
}

impl Image {
    /// Width over height, guarding against zero-sized metadata.
    pub fn aspect_ratio(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

impl From<RawImageRow> for Image {
    fn from(row: RawImageRow) -> Self {
        let tags = row.tags.unwrap_or_default();
        let title = tags.first().cloned().unwrap_or_else(|| UNTITLED.to_string());
        let source = row
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
        Self {
            id: row.id,
            url: row.gcs_url,
            title,
            source,
            display_date: format_display_date(row.created_at),
            created_at: row.created_at,
            tags,
            width: row.width,
            height: row.height,
        }
    }
}

pub fn format_display_date(at: DateTime<Utc>) -> String {
    at.format(DISPLAY_DATE_FORMAT).to_string()
}
