use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use tracing::{debug, warn};

use crate::digest::{DigestEntry, ManifestDigest};
use crate::error::{Error, Result};
use crate::image_reference::ImageReference;
use crate::media_type::{ManifestVersion, guess_manifest_media_type};
use crate::models::{ManifestList, RegistryErrors};
use crate::session::RegistrySession;

/// Versions probed when the caller does not name any.
pub const DEFAULT_VERSIONS: [ManifestVersion; 2] = [ManifestVersion::V1, ManifestVersion::V2];

const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

impl RegistrySession {
    async fn query_manifest(
        &mut self,
        image: &ImageReference,
        version: ManifestVersion,
    ) -> Result<Response> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(version.media_type()));
        debug!("querying {} for a {} manifest of {}", self.hostname(), version, image);
        self.get(&image.manifest_path(), headers).await
    }

    /// Resolve which manifest schemas the registry holds for `image`, and
    /// under which digests.
    ///
    /// One GET per requested version, `Accept` set to that version's media
    /// type. `versions: None` probes v1 and v2; an explicitly empty slice
    /// performs no network calls. Registries that cannot serve a requested
    /// schema (404 `MANIFEST_UNKNOWN`, or 400 `MANIFEST_INVALID` for a legacy
    /// downconversion) leave that version absent; any other failure aborts
    /// the whole call. With `require_digest`, an all-absent result is an
    /// error instead.
    pub async fn get_manifest_digests(
        &mut self,
        image: &ImageReference,
        versions: Option<&[ManifestVersion]>,
        require_digest: bool,
    ) -> Result<ManifestDigest> {
        let versions = versions.unwrap_or(&DEFAULT_VERSIONS);
        let mut digests = ManifestDigest::default();

        for &version in versions {
            let response = self.query_manifest(image, version).await?;
            let status = response.status();

            if status != StatusCode::OK {
                let body = response.bytes().await?;
                // 404/MANIFEST_UNKNOWN and 400/MANIFEST_INVALID mean this
                // schema variant is not available; anything else is fatal
                check_expected_failure(status, &body)?;
                debug!("no {} manifest for {}: {}", version, image, status);
                continue;
            }

            let digest_header = response
                .headers()
                .get(DOCKER_CONTENT_DIGEST)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let body = response.bytes().await?;

            let Some(detected) = classify_response(content_type.as_deref(), &body) else {
                warn!(
                    "{} served a manifest for {} with no recognizable schema",
                    self.hostname(),
                    image
                );
                continue;
            };
            if detected != version {
                debug!(
                    "requested a {} manifest of {}, registry returned {}",
                    version, image, detected
                );
            }

            // The result is keyed by what the registry actually served, not
            // by what was asked for
            let entry = match digest_header {
                Some(digest) => DigestEntry::Digest(digest),
                None => DigestEntry::Present,
            };
            digests.set(detected, entry);
        }

        if digests.is_empty() {
            if require_digest {
                return Err(Error::NoDigestsFound {
                    image: image.to_string(),
                });
            }
            debug!("no manifest digest found for {}", image);
        }

        Ok(digests)
    }

    /// Fetch the manifest list the registry holds for `image`.
    ///
    /// Returns `None` when the registry has no manifest list for the tag,
    /// either answering with an expected error or serving a different schema.
    pub async fn get_manifest_list(
        &mut self,
        image: &ImageReference,
    ) -> Result<Option<ManifestList>> {
        let response = self.query_manifest(image, ManifestVersion::V2List).await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.bytes().await?;
            check_expected_failure(status, &body)?;
            debug!("no manifest list for {}: {}", image, status);
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        match classify_response(content_type.as_deref(), &body) {
            Some(ManifestVersion::V2List) => {
                let list = serde_json::from_slice(&body).map_err(Error::InvalidManifest)?;
                Ok(Some(list))
            }
            detected => {
                warn!(
                    "registry served {} instead of a manifest list for {}",
                    detected.map_or_else(|| "an unidentifiable document".to_string(), |v| v.to_string()),
                    image
                );
                Ok(None)
            }
        }
    }
}

/// Classify which schema a 200 response carries: the `Content-Type` header
/// wins, the body is sniffed only when the header is missing or not a known
/// manifest type (e.g. a generic `application/json`).
fn classify_response(content_type: Option<&str>, body: &[u8]) -> Option<ManifestVersion> {
    if let Some(content_type) = content_type {
        if let Some(version) = ManifestVersion::from_media_type_prefix(content_type) {
            return Some(version);
        }
    }
    guess_manifest_media_type(body)
        .and_then(|media_type| ManifestVersion::from_media_type_prefix(&media_type))
}

// Absorbs the two per-version conditions that merely mean "this schema is not
// available here"; everything else becomes a fatal UnexpectedResponse.
fn check_expected_failure(status: StatusCode, body: &[u8]) -> Result<()> {
    let absorbed = match serde_json::from_slice::<RegistryErrors>(body) {
        Ok(errors) => match status {
            StatusCode::BAD_REQUEST => errors.has_code("MANIFEST_INVALID"),
            StatusCode::NOT_FOUND => errors.has_code("MANIFEST_UNKNOWN"),
            _ => false,
        },
        Err(_) => false,
    };

    if absorbed {
        Ok(())
    } else {
        Err(Error::UnexpectedResponse {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }
}
