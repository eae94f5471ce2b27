use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Manifest, schema 1 (legacy).
pub const MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";
/// Manifest, schema 2.
pub const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// Manifest list (aka "fat manifest").
pub const MANIFEST_LIST_V2: &str = "application/vnd.docker.distribution.manifest.list.v2+json";
/// OCI image manifest.
pub const MANIFEST_OCI: &str = "application/vnd.oci.image.manifest.v1+json";
/// OCI image index.
pub const MANIFEST_OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// The manifest schema variants a registry can hold for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestVersion {
    V1,
    V2,
    V2List,
    Oci,
    OciIndex,
}

impl ManifestVersion {
    pub const ALL: [ManifestVersion; 5] = [
        ManifestVersion::V1,
        ManifestVersion::V2,
        ManifestVersion::V2List,
        ManifestVersion::Oci,
        ManifestVersion::OciIndex,
    ];

    /// The media type requested and served for this version.
    pub fn media_type(self) -> &'static str {
        match self {
            ManifestVersion::V1 => MANIFEST_V1,
            ManifestVersion::V2 => MANIFEST_V2,
            ManifestVersion::V2List => MANIFEST_LIST_V2,
            ManifestVersion::Oci => MANIFEST_OCI,
            ManifestVersion::OciIndex => MANIFEST_OCI_INDEX,
        }
    }

    /// Exact inverse of [`media_type`](Self::media_type). Unknown media types
    /// are not an error here; the caller decides whether that is fatal.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|version| version.media_type() == media_type)
    }

    /// Inverse lookup that tolerates serialization-suffix variance: both sides
    /// are compared with everything from the last `+` removed, so
    /// `…manifest.v1+jsonish` or a signed `…+prettyjws` still classify.
    pub fn from_media_type_prefix(media_type: &str) -> Option<Self> {
        let prefix = strip_serialization_suffix(media_type);
        Self::ALL
            .into_iter()
            .find(|version| strip_serialization_suffix(version.media_type()) == prefix)
    }
}

fn strip_serialization_suffix(media_type: &str) -> &str {
    match media_type.rsplit_once('+') {
        Some((prefix, _)) => prefix,
        None => media_type,
    }
}

impl fmt::Display for ManifestVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestVersion::V1 => write!(f, "v1"),
            ManifestVersion::V2 => write!(f, "v2"),
            ManifestVersion::V2List => write!(f, "v2_list"),
            ManifestVersion::Oci => write!(f, "oci"),
            ManifestVersion::OciIndex => write!(f, "oci_index"),
        }
    }
}

impl FromStr for ManifestVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(ManifestVersion::V1),
            "v2" => Ok(ManifestVersion::V2),
            "v2_list" => Ok(ManifestVersion::V2List),
            "oci" => Ok(ManifestVersion::Oci),
            "oci_index" => Ok(ManifestVersion::OciIndex),
            other => Err(Error::UnknownVersion(other.to_string())),
        }
    }
}

/// Best-effort classification of raw manifest bytes, for responses whose
/// `Content-Type` header is missing or unusable.
///
/// Returns the media type the document claims for itself: an explicit
/// `mediaType` field wins, a bare `schemaVersion: 1` means the legacy v1 type,
/// and anything else is ambiguous (`None`). Never fails.
pub fn guess_manifest_media_type(content: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(content).ok()?;

    if let Some(media_type) = value.get("mediaType").and_then(|v| v.as_str()) {
        return Some(media_type.to_string());
    }

    if value.get("schemaVersion").and_then(|v| v.as_i64()) == Some(1) {
        return Some(MANIFEST_V1.to_string());
    }

    // schemaVersion 2 without an explicit mediaType: could be any of the
    // schema-2 variants, only the Content-Type header can tell
    None
}
