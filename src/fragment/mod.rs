//! Fragments
//!
//! A fragment is an HTML snippet served by the origin that replaces the
//! contents of one placeholder container in the page (sidebar, navbar,
//! vendor-script bundle, ...).
//!
//! ## Contents
//!
//! - [`FragmentRequest`]: one container id → fragment URL pair
//! - [`FragmentResult`]: outcome of fetching one fragment
//! - [`FragmentFetcher`]: the network seam, with [`HttpFetcher`] over reqwest
//! - [`CredentialProvider`]: read-only bearer token source for fetchers

mod credentials;
mod error;
mod fetcher;

pub use credentials::{CredentialProvider, EnvToken, NoCredentials, StaticToken};
pub use error::{LoadError, LoadResult};
pub use fetcher::{FragmentFetcher, HttpFetcher};

use serde::{Deserialize, Serialize};

/// A request to load one fragment into one container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FragmentRequest {
    /// Identifier of the target container in the page
    pub container_id: String,
    /// URL of the fragment markup
    pub source_url: String,
}

impl FragmentRequest {
    pub fn new(container_id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            source_url: source_url.into(),
        }
    }

    /// Build requests from a container → URL mapping
    ///
    /// Order is preserved but carries no meaning: requests run concurrently.
    /// Duplicate container ids are kept; whichever injection lands last wins.
    pub fn from_mapping<I, K, V>(mapping: I) -> Vec<FragmentRequest>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        mapping
            .into_iter()
            .map(|(id, url)| FragmentRequest::new(id, url))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for FragmentRequest {
    fn from((container_id, source_url): (K, V)) -> Self {
        FragmentRequest::new(container_id, source_url)
    }
}

/// Outcome of fetching one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentResult {
    /// Fetched markup, ready for injection
    Loaded(String),
    /// Fetch failed; the container must be left untouched
    Failed(LoadError),
}

impl From<LoadResult<String>> for FragmentResult {
    fn from(result: LoadResult<String>) -> Self {
        match result {
            Ok(html) => FragmentResult::Loaded(html),
            Err(e) => FragmentResult::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_from_mapping() {
        let mut mapping = BTreeMap::new();
        mapping.insert("sidebar", "/partials/sidebar.html");
        mapping.insert("navbar", "/partials/navbar.html");

        let requests = FragmentRequest::from_mapping(mapping);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], FragmentRequest::new("navbar", "/partials/navbar.html"));
        assert_eq!(requests[1].container_id, "sidebar");
    }

    #[test]
    fn test_from_mapping_keeps_duplicates() {
        let requests = FragmentRequest::from_mapping(vec![
            ("sidebar", "/a.html"),
            ("sidebar", "/b.html"),
        ]);
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn test_fragment_result_from_load_result() {
        let loaded: FragmentResult = Ok("<nav></nav>".to_string()).into();
        assert_eq!(loaded, FragmentResult::Loaded("<nav></nav>".into()));

        let failed: FragmentResult = Err(LoadError::Timeout { timeout_ms: 1 }).into();
        assert!(matches!(failed, FragmentResult::Failed(LoadError::Timeout { .. })));
    }
}
