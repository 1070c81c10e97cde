use super::kind::ObjectKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Searchable projection of a catalog record, as fed to the embedded index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CatalogRecord {
    #[validate(length(min = 1, max = 512))]
    pub id: String,

    #[serde(default)]
    pub kind: ObjectKind,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub organizations: Vec<String>,

    /// PENDING, RELEASED or WITHDRAWN
    #[serde(default)]
    pub status: Option<String>,

    /// Top-level collection the record belongs to
    #[serde(default)]
    pub collection: Option<String>,

    /// Direct container
    #[serde(default)]
    pub parent: Option<String>,

    /// Every container above the record
    #[serde(default)]
    pub ancestors: Vec<String>,

    #[serde(default)]
    pub creator: Option<String>,

    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,

    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub filetype: Option<String>,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub filesize: Option<i64>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub checksum: Option<String>,

    /// Extracted file content, indexed but not stored
    #[serde(default)]
    pub fulltext: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

impl CatalogRecord {
    pub fn new(id: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id: id.into(),
            kind,
            ..Default::default()
        }
    }

    /// Parent followed by the other ancestors, without duplicates
    pub fn containers(&self) -> Vec<&str> {
        let mut containers: Vec<&str> = Vec::with_capacity(self.ancestors.len() + 1);
        for container in self.parent.iter().chain(self.ancestors.iter()) {
            if !containers.contains(&container.as_str()) {
                containers.push(container);
            }
        }
        containers
    }
}
