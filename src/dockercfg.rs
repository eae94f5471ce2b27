use std::collections::HashMap;
use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

/// Reduce a registry locator to the `host[:port]` key used for credential
/// lookup. Strings without a scheme prefix are returned untouched, even when
/// they contain slashes.
pub fn registry_hostname(registry: &str) -> String {
    for scheme in ["http://", "https://"] {
        if let Some(rest) = registry.strip_prefix(scheme) {
            let host = match rest.find('/') {
                Some(slash) => &rest[..slash],
                None => rest,
            };
            return host.to_string();
        }
    }
    registry.to_string()
}

/// Basic-auth credentials for one registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// One entry of the .dockercfg file. Older files carry a base64 `auth` blob
// instead of split username/password fields.
#[derive(Debug, Clone, Deserialize)]
struct DockercfgEntry {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    auth: Option<String>,
}

impl DockercfgEntry {
    fn resolve(&self) -> Option<Credentials> {
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            });
        }

        // Fall back to the legacy `auth` field holding base64("user:pass")
        let auth = self.auth.as_ref()?;
        let decoded = STANDARD.decode(auth).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Registry credentials loaded from a `.dockercfg` file: a JSON object keyed
/// by registry locator.
#[derive(Debug, Clone, Default)]
pub struct Dockercfg {
    entries: HashMap<String, DockercfgEntry>,
}

impl Dockercfg {
    /// Load the `.dockercfg` file from the given secret directory.
    pub fn new(secret_path: &Path) -> Result<Self> {
        let path = secret_path.join(".dockercfg");
        let data = fs::read(&path).map_err(|err| Error::Dockercfg {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        let entries = serde_json::from_slice(&data).map_err(|err| Error::Dockercfg {
            path,
            reason: err.to_string(),
        })?;
        Ok(Self { entries })
    }

    /// Resolve credentials for a registry locator. Both the query and the
    /// stored keys are compared by normalized hostname; there is no partial
    /// matching.
    pub fn get_credentials(&self, registry: &str) -> Option<Credentials> {
        let hostname = registry_hostname(registry);
        for (key, entry) in &self.entries {
            if registry_hostname(key) == hostname {
                return entry.resolve();
            }
        }
        warn!("{} not found in .dockercfg", hostname);
        None
    }
}
