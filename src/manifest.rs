//! Script manifest data model
//!
//! A manifest is the JSON document served by the remote endpoint. Only the
//! `js` field is recognized; everything else in the payload is ignored.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ManifestError;

/// Ordered list of script URLs published by a remote endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Script URLs (absolute or relative), in the order they should load
    #[serde(default, deserialize_with = "null_as_empty")]
    pub js: Vec<String>,
}

/// Treats `"js": null` the same as a missing field
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Manifest {
    /// Creates a manifest from a list of script URLs
    pub fn new<I, S>(js: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            js: js.into_iter().map(Into::into).collect(),
        }
    }

    /// The canonical fallback manifest, `{"js": []}`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a response body into a manifest
    ///
    /// Only a body that is not valid JSON is an error. Valid JSON that is not
    /// an object with a string-array `js` yields an empty manifest.
    pub fn from_json(body: &[u8]) -> Result<Self, ManifestError> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Ok(Self::empty());
        }
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    pub fn is_empty(&self) -> bool {
        self.js.is_empty()
    }
}
