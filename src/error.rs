use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("connection to registry failed: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("unexpected registry response: {status}: {body}")]
    UnexpectedResponse { status: StatusCode, body: String },

    #[error("unrecognized manifest version: {0}")]
    UnknownVersion(String),

    #[error("no manifest digest found for {image}")]
    NoDigestsFound { image: String },

    #[error("no version present in manifest digest record")]
    NoVersionPresent,

    #[error("failed to read registry secret {path}: {reason}")]
    Dockercfg { path: PathBuf, reason: String },

    #[error("invalid manifest list document: {0}")]
    InvalidManifest(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
