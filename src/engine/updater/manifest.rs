//! Update Manifest
//!
//! The feed answers with a small JSON document describing the latest package.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::Result;

/// Raw feed document. Every field is optional on the wire so that an
/// incomplete document still parses and is then rejected as a whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDocument {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub release_notes: Option<String>,
}

/// A complete manifest: both `url` and `version` are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManifest {
    pub url: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
}

impl FeedDocument {
    /// Promote to a manifest, or `None` if a required field is missing or empty.
    pub fn into_manifest(self) -> Option<UpdateManifest> {
        let url = self.url.filter(|u| !u.is_empty())?;
        let version = self.version.filter(|v| !v.is_empty())?;
        Some(UpdateManifest {
            url,
            version,
            hash: self.hash.filter(|h| !h.is_empty()),
            release_notes: self.release_notes,
        })
    }

    /// Pick the known fields out of a JSON value. Anything that is not an
    /// object, and any field that is not a string, reads as absent.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        match value {
            Value::Object(_) => Self {
                url: field("url"),
                version: field("version"),
                hash: field("hash"),
                release_notes: field("releaseNotes"),
            },
            _ => Self::default(),
        }
    }
}

/// Interpret a feed response body.
///
/// Only a zero-length body means there is no manifest. Any other body must
/// be valid JSON. Valid JSON without a string `url` and `version` (`null`,
/// numbers, arrays, incomplete objects) means "no update".
pub fn parse_feed_body(body: &[u8]) -> Result<Option<UpdateManifest>> {
    if body.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body)?;
    Ok(FeedDocument::from_value(&value).into_manifest())
}
