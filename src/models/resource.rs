//! Host catalog entities, limited to the attributes the orchestrator reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::serde::{deserialize_asbool, deserialize_non_empty};

/// A catalog resource
///
/// A resource is a candidate (ingestible, no parent), a parent
/// (`spatial_parent`, has spawned derived children) or a child
/// (`spatial_child_of` set, never submitted itself).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub package_id: String,
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "deserialize_asbool")]
    pub spatial_parent: bool,
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub spatial_child_of: Option<String>,
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub last_modified: Option<String>,
    /// Unvalidated form extras; `format` here overrides the declared format
    #[serde(rename = "__extras", default, skip_serializing_if = "Map::is_empty")]
    pub form_extras: Map<String, Value>,
    /// Every other attribute, preserved across updates
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl Resource {
    pub fn new(id: impl Into<String>, package_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            package_id: package_id.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn child_of(mut self, parent_id: impl Into<String>) -> Self {
        self.spatial_child_of = Some(parent_id.into());
        self
    }

    pub fn as_parent(mut self) -> Self {
        self.spatial_parent = true;
        self
    }

    /// Format override supplied through the resource form, if any
    pub fn format_override(&self) -> Option<&str> {
        self.form_extras
            .get("format")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn is_child(&self) -> bool {
        self.spatial_child_of.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

/// A catalog package (dataset) with its resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub organization: Option<Organization>,
    #[serde(default)]
    pub creator_user_id: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Package {
    /// Ids of resources derived from `parent_id`
    pub fn children_of(&self, parent_id: &str) -> Vec<String> {
        self.resources
            .iter()
            .filter(|r| r.spatial_child_of.as_deref() == Some(parent_id))
            .map(|r| r.id.clone())
            .collect()
    }
}

/// One entry of a package's activity stream, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub user_id: String,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A catalog user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub apikey: Option<String>,
}
