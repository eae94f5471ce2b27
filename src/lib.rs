pub mod client;
pub mod digest;
pub mod dockercfg;
pub mod error;
pub mod image_reference;
pub mod media_type;
pub mod models;
pub mod session;

// Re-export main types for convenience
pub use client::DEFAULT_VERSIONS;
pub use digest::{DigestEntry, ManifestDigest};
pub use dockercfg::{Credentials, Dockercfg, registry_hostname};
pub use error::{Error, Result};
pub use image_reference::ImageReference;
pub use media_type::{ManifestVersion, guess_manifest_media_type};
pub use models::{Descriptor, ManifestList, Platform};
pub use session::RegistrySession;
