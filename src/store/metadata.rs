//! Metadata sidecar records for stored objects
//!
//! Every object written through [`ObjectStore::store_with_metadata`] gets a
//! JSON sidecar describing what the object is and the logical paths it is
//! reachable under. The sidecar never changes the object it describes.
//!
//! [`ObjectStore::store_with_metadata`]: super::ObjectStore::store_with_metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sidecar record describing a stored object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Object id this record describes (filled in on store)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Record type ("session", "tool", "url", ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Human-readable title
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Searchable tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Owning session id, if any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session: String,

    /// Agent that produced the object, if any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub agent: String,

    /// Lifecycle classification: draft, active, stable, archived
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lifecycle: String,

    /// Creation timestamp, set on first save if absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Logical paths the object is retrievable under
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

impl Metadata {
    /// Create an empty metadata record of the given type
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }
}
