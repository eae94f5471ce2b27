use serde::{Deserialize, Serialize};

/// Platform selector inside a manifest-list entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system
    pub os: String,
    /// CPU architecture
    pub architecture: String,
    /// Optional variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Descriptor referencing one per-platform manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced manifest
    pub media_type: String,
    /// Digest of the referenced manifest, verbatim
    pub digest: String,
    /// Size of the referenced manifest in bytes
    pub size: u64,
    /// Platform the referenced manifest targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

/// A manifest list, referencing per-platform manifests under one tag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestList {
    /// Schema version of the manifest list
    pub schema_version: i32,
    /// Media type of the manifest list itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// The referenced manifests
    pub manifests: Vec<Descriptor>,
}

impl ManifestList {
    /// The digest recorded for one platform, if the list carries it.
    pub fn digest_for_platform(&self, os: &str, architecture: &str) -> Option<&str> {
        self.manifests
            .iter()
            .find(|descriptor| {
                descriptor
                    .platform
                    .as_ref()
                    .is_some_and(|p| p.os == os && p.architecture == architecture)
            })
            .map(|descriptor| descriptor.digest.as_str())
    }
}

/// Error body the registry API returns with 4xx statuses:
/// `{"errors": [{"code": "...", ...}]}`
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryErrors {
    pub errors: Vec<RegistryError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryError {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl RegistryErrors {
    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().any(|error| error.code == code)
    }
}
