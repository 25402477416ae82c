//! Object storage bucket type.

use serde::{Deserialize, Serialize};

/// A named durable storage container
///
/// Created once and reused on subsequent runs; existence is the success
/// path, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub storage_class: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_class: None,
            location: None,
        }
    }
}
