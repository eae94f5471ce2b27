use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, Response};
use tracing::debug;

use crate::dockercfg::{Credentials, Dockercfg, registry_hostname};
use crate::error::{Error, Result};

/// Authenticated HTTP session against one registry.
///
/// The scheme for a schemeless locator is resolved lazily on the first
/// request and cached for the lifetime of the session: `https` first, with a
/// single fallback to `http` when the probe fails at the connection level and
/// the session was marked insecure. A session is meant to serve one
/// resolution call; do not share it across registries.
pub struct RegistrySession {
    registry: String,
    hostname: String,
    base_url: Option<String>,
    insecure: bool,
    credentials: Option<Credentials>,
    client: ReqwestClient,
}

impl RegistrySession {
    /// Create a session for the given registry locator. Credentials are
    /// resolved once, against the normalized hostname.
    pub fn new(registry: &str, insecure: bool, dockercfg: Option<&Dockercfg>) -> Result<Self> {
        Self::with_timeout(registry, insecure, dockercfg, None)
    }

    /// Like [`new`](Self::new), with a per-request timeout. A timed-out
    /// request counts as a connection-level failure.
    pub fn with_timeout(
        registry: &str,
        insecure: bool,
        dockercfg: Option<&Dockercfg>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let hostname = registry_hostname(registry);
        let credentials = dockercfg.and_then(|cfg| cfg.get_credentials(registry));

        let mut builder = ReqwestClient::builder();
        if insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        // A locator with an explicit scheme is used verbatim and never
        // subject to fallback
        let base_url = if registry.starts_with("http://") || registry.starts_with("https://") {
            Some(registry.trim_end_matches('/').to_string())
        } else {
            None
        };

        Ok(Self {
            registry: registry.to_string(),
            hostname,
            base_url,
            insecure,
            credentials,
            client,
        })
    }

    /// The normalized `host[:port]` of this session's registry.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn send(
        &self,
        method: Method,
        base: &str,
        path: &str,
        headers: &HeaderMap,
        body: Option<&Bytes>,
    ) -> std::result::Result<Response, reqwest::Error> {
        let url = format!("{}{}", base, path);
        let mut request = self.client.request(method, &url).headers(headers.clone());

        if let Some(body) = body {
            request = request.body(body.clone());
        }

        // Attach basic auth whenever the dockercfg resolved a match
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        request.send().await
    }

    pub(crate) async fn request(
        &mut self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<Response> {
        // Scheme already decided, either explicitly or by an earlier probe
        if let Some(base) = self.base_url.clone() {
            return self
                .send(method, &base, path, &headers, body.as_ref())
                .await
                .map_err(Error::Connection);
        }

        let https_base = format!("https://{}", self.registry);
        match self
            .send(method.clone(), &https_base, path, &headers, body.as_ref())
            .await
        {
            Ok(response) => {
                self.base_url = Some(https_base);
                Ok(response)
            }
            Err(err) if self.insecure => {
                debug!(
                    "https probe of {} failed ({}), retrying over http",
                    self.registry, err
                );
                let http_base = format!("http://{}", self.registry);
                let response = self
                    .send(method, &http_base, path, &headers, body.as_ref())
                    .await
                    .map_err(Error::Connection)?;
                self.base_url = Some(http_base);
                Ok(response)
            }
            Err(err) => Err(Error::Connection(err)),
        }
    }

    /// GET a registry path.
    pub async fn get(&mut self, path: &str, headers: HeaderMap) -> Result<Response> {
        self.request(Method::GET, path, headers, None).await
    }

    /// HEAD a registry path.
    pub async fn head(&mut self, path: &str, headers: HeaderMap) -> Result<Response> {
        self.request(Method::HEAD, path, headers, None).await
    }

    /// PUT a body to a registry path.
    pub async fn put(
        &mut self,
        path: &str,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Result<Response> {
        self.request(Method::PUT, path, headers, Some(body.into()))
            .await
    }

    /// DELETE a registry path.
    pub async fn delete(&mut self, path: &str, headers: HeaderMap) -> Result<Response> {
        self.request(Method::DELETE, path, headers, None).await
    }
}
