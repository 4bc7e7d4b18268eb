//! Fragment fetchers
//!
//! HTTP client that retrieves fragment markup from the origin server.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::sync::Arc;

use super::credentials::{CredentialProvider, NoCredentials};
use super::error::{LoadError, LoadResult};

/// Something that can turn a fragment URL into its HTML body
#[async_trait]
pub trait FragmentFetcher: Send + Sync {
    /// Fetch `url` with a plain GET and return the body as text
    async fn fetch(&self, url: &str) -> LoadResult<String>;
}

/// reqwest-backed fetcher
///
/// Relative fragment URLs (`/partials/sidebar.html`) are resolved against
/// the configured base URL, the way a browser resolves them against the
/// page origin.
pub struct HttpFetcher {
    client: Client,
    base_url: Option<Url>,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpFetcher {
    /// Create a fetcher, optionally rooted at `base_url`
    pub fn new(base_url: Option<&str>) -> LoadResult<Self> {
        let base_url = base_url
            .map(|raw| {
                Url::parse(raw).map_err(|e| LoadError::InvalidUrl {
                    url: raw.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        let client = Client::builder()
            .user_agent(concat!("partials/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Wrap an existing client
    pub fn with_client(client: Client, base_url: Option<Url>) -> Self {
        Self {
            client,
            base_url,
            credentials: Arc::new(NoCredentials),
        }
    }

    /// Attach a bearer token provider; the token is read on every fetch
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Base URL relative fragment paths are resolved against
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolve a fragment URL to an absolute one
    pub fn resolve(&self, url: &str) -> LoadResult<Url> {
        // Joining an absolute URL onto a base yields the absolute URL unchanged
        let resolved = match &self.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };

        resolved.map_err(|e| LoadError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl FragmentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> LoadResult<String> {
        let resolved = self.resolve(url)?;

        let mut request = self.client.get(resolved);
        if let Some(token) = self.credentials.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Network {
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            });
        }

        response.text().await.map_err(|e| LoadError::Decode {
            message: e.to_string(),
        })
    }
}
