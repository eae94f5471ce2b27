use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error type for image reference parsing
#[derive(Debug, Error)]
pub enum ImageReferenceError {
    #[error("Invalid image reference format: {0}")]
    InvalidFormat(String),
}

/// A docker-style image reference: `[hostname/]name[:tag]` or
/// `[hostname/]name@digest`.
///
/// The hostname names the registry the reference was written against; manifest
/// queries ignore it and use the registry locator the session was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Optional hostname (registry)
    pub hostname: Option<String>,
    /// Repository name, possibly namespaced (`food/spam`)
    pub name: String,
    /// Tag, or a `algo:hex` digest for pinned references
    pub tag: String,
}

impl ImageReference {
    /// Create a new ImageReference
    pub fn new(hostname: Option<String>, name: String, tag: String) -> Self {
        Self { hostname, name, tag }
    }

    /// Registry API path of the manifest endpoint for this reference.
    pub fn manifest_path(&self) -> String {
        format!("/v2/{}/manifests/{}", self.name, self.tag)
    }

    /// Whether this reference pins a digest rather than a tag.
    pub fn is_digest(&self) -> bool {
        self.tag.contains(':')
    }
}

// The first path segment counts as a registry hostname only when it could be
// one: it contains a dot or a port, or is the literal "localhost".
fn looks_like_hostname(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

impl FromStr for ImageReference {
    type Err = ImageReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.starts_with('/') {
            return Err(ImageReferenceError::InvalidFormat(s.to_string()));
        }

        // Digest references use '@', tags use ':'
        let (remainder, tag) = if let Some((left, digest)) = s.split_once('@') {
            (left, Some(digest.to_string()))
        } else {
            (s, None)
        };

        let (hostname, name_and_tag) = match remainder.split_once('/') {
            Some((first, rest)) if looks_like_hostname(first) => {
                (Some(first.to_string()), rest)
            }
            _ => (None, remainder),
        };

        let (name, tag) = match tag {
            Some(digest) => (name_and_tag.to_string(), digest),
            None => match name_and_tag.rsplit_once(':') {
                Some((name, tag)) => (name.to_string(), tag.to_string()),
                None => (name_and_tag.to_string(), "latest".to_string()),
            },
        };

        if name.is_empty() || tag.is_empty() {
            return Err(ImageReferenceError::InvalidFormat(s.to_string()));
        }

        Ok(ImageReference { hostname, name, tag })
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(hostname) = &self.hostname {
            write!(f, "{}/", hostname)?;
        }
        // Tags cannot contain ':', so a colon marks a digest reference
        let separator = if self.is_digest() { '@' } else { ':' };
        write!(f, "{}{}{}", self.name, separator, self.tag)
    }
}
