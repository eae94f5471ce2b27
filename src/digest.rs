use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::media_type::ManifestVersion;

/// What a registry holds for one manifest schema: nothing, a manifest whose
/// digest the server withheld, or a manifest with its content digest.
///
/// The digest string is stored verbatim from the `Docker-Content-Digest`
/// header; validating it belongs to consumers that dereference it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DigestEntry {
    #[default]
    Absent,
    Present,
    Digest(String),
}

impl DigestEntry {
    pub fn is_absent(&self) -> bool {
        matches!(self, DigestEntry::Absent)
    }

    /// True for both `Present` and `Digest`.
    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    /// The digest string, when the server returned one.
    pub fn digest(&self) -> Option<&str> {
        match self {
            DigestEntry::Digest(digest) => Some(digest),
            _ => None,
        }
    }
}

impl fmt::Display for DigestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestEntry::Absent => write!(f, "absent"),
            DigestEntry::Present => write!(f, "present (digest unknown)"),
            DigestEntry::Digest(digest) => write!(f, "{}", digest),
        }
    }
}

// Serialized as null / true / "digest", the shape consumers of build
// metadata expect.
impl Serialize for DigestEntry {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            DigestEntry::Absent => serializer.serialize_none(),
            DigestEntry::Present => serializer.serialize_bool(true),
            DigestEntry::Digest(digest) => serializer.serialize_str(digest),
        }
    }
}

impl<'de> Deserialize<'de> for DigestEntry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Null => Ok(DigestEntry::Absent),
            serde_json::Value::Bool(true) => Ok(DigestEntry::Present),
            serde_json::Value::String(digest) => Ok(DigestEntry::Digest(digest)),
            other => Err(serde::de::Error::custom(format!(
                "expected null, true or a digest string, got {}",
                other
            ))),
        }
    }
}

/// The digests a registry holds for one image, one entry per manifest schema.
///
/// Filled during a single resolution call; immutable to callers afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDigest {
    #[serde(default)]
    pub v1: DigestEntry,
    #[serde(default)]
    pub v2: DigestEntry,
    #[serde(default)]
    pub v2_list: DigestEntry,
    #[serde(default)]
    pub oci: DigestEntry,
    #[serde(default)]
    pub oci_index: DigestEntry,
}

const ABSENT: DigestEntry = DigestEntry::Absent;

// Strict preference order for the default accessor: the widest document wins.
const PRIORITY: [ManifestVersion; 5] = [
    ManifestVersion::V2List,
    ManifestVersion::OciIndex,
    ManifestVersion::Oci,
    ManifestVersion::V2,
    ManifestVersion::V1,
];

impl ManifestDigest {
    /// The entry recorded for one schema version.
    pub fn entry(&self, version: ManifestVersion) -> &DigestEntry {
        match version {
            ManifestVersion::V1 => &self.v1,
            ManifestVersion::V2 => &self.v2,
            ManifestVersion::V2List => &self.v2_list,
            ManifestVersion::Oci => &self.oci,
            ManifestVersion::OciIndex => &self.oci_index,
        }
    }

    pub(crate) fn set(&mut self, version: ManifestVersion, entry: DigestEntry) {
        let field = match version {
            ManifestVersion::V1 => &mut self.v1,
            ManifestVersion::V2 => &mut self.v2,
            ManifestVersion::V2List => &mut self.v2_list,
            ManifestVersion::Oci => &mut self.oci,
            ManifestVersion::OciIndex => &mut self.oci_index,
        };
        *field = entry;
    }

    /// Field lookup by name. Accepts the five version names and `"default"`;
    /// anything else fails with [`Error::UnknownVersion`].
    pub fn get(&self, name: &str) -> Result<&DigestEntry> {
        if name == "default" {
            return Ok(self.default_digest());
        }
        let version: ManifestVersion = name.parse()?;
        Ok(self.entry(version))
    }

    /// The preferred entry: `v2_list > oci_index > oci > v2 > v1`, or
    /// `Absent` when nothing was recorded.
    pub fn default_digest(&self) -> &DigestEntry {
        for version in PRIORITY {
            let entry = self.entry(version);
            if entry.is_present() {
                return entry;
            }
        }
        &ABSENT
    }

    /// The schema version [`default_digest`](Self::default_digest) selected.
    pub fn default_version(&self) -> Result<ManifestVersion> {
        PRIORITY
            .into_iter()
            .find(|version| self.entry(*version).is_present())
            .ok_or(Error::NoVersionPresent)
    }

    /// True when no schema version was recorded at all.
    pub fn is_empty(&self) -> bool {
        PRIORITY.iter().all(|version| self.entry(*version).is_absent())
    }
}
