//! Layout Loader
//!
//! Fetches a batch of fragments concurrently and splices each one into its
//! container, then re-activates the scripts of the designated activation
//! container.
//!
//! ## Contract
//!
//! - every request is issued without waiting for the others
//! - a failed, timed-out or undeliverable fragment leaves its container
//!   untouched and never affects the rest of the batch
//! - the call returns only once every request has settled, and never fails
//! - activation scripts are appended in document order; external ones with
//!   `async_load = false`
//!
//! ## Concurrency
//!
//! Fetches are polled together on the calling task through
//! `FuturesUnordered`; each completion is applied to the document from the
//! same loop, one at a time. Document writes therefore never interleave and
//! the document needs no locking.
//!
//! ## Re-entry
//!
//! Loading the same batch twice replaces each container twice and appends
//! the activation scripts twice. Nothing stops the second activation; it is
//! only logged and reported with an activation count above 1. Use
//! [`LayoutLoader::load`] when scripts must not run again.

mod events;
mod report;

pub use events::{ContainerReady, LoaderEvent, ReadyError};
pub use report::{ContainerOutcome, Injection, LoadReport};

use chrono::Utc;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::Instrument;
use uuid::Uuid;

use crate::document::Document;
use crate::fragment::{FragmentFetcher, FragmentRequest, FragmentResult, LoadError};
use crate::script::{extract_scripts, ScriptNode};

/// Default activation container, the vendor-script bundle
pub const DEFAULT_ACTIVATION_CONTAINER: &str = "vendorjs";

/// Runtime options for a [`LayoutLoader`]
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Container whose scripts are re-executed after injection
    pub activation_container: Option<String>,
    /// Upper bound for a single fragment fetch
    pub fetch_timeout: Duration,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            activation_container: Some(DEFAULT_ACTIVATION_CONTAINER.to_string()),
            fetch_timeout: Duration::from_secs(10),
            event_capacity: 256,
        }
    }
}

impl From<&crate::config::LoaderConfig> for LoaderOptions {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        Self {
            activation_container: config.activation_container.clone(),
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            event_capacity: config.event_capacity.max(1),
        }
    }
}

/// Whether injected fragments get their scripts re-executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Inject markup only
    Inject,
    /// Inject markup and activate the activation container's scripts
    InjectAndActivate,
}

/// Fragment loader / script activator
pub struct LayoutLoader {
    fetcher: Arc<dyn FragmentFetcher>,
    options: LoaderOptions,
    events: broadcast::Sender<LoaderEvent>,
    /// Activation count per container id, across batches
    activations: Mutex<HashMap<String, u32>>,
}

impl LayoutLoader {
    /// Create a loader with default options
    pub fn new(fetcher: Arc<dyn FragmentFetcher>) -> Self {
        Self::with_options(fetcher, LoaderOptions::default())
    }

    pub fn with_options(fetcher: Arc<dyn FragmentFetcher>, options: LoaderOptions) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));

        Self {
            fetcher,
            options,
            events,
            activations: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Subscribe to loader events
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.events.subscribe()
    }

    /// Start waiting for a container to be filled
    ///
    /// Call before starting the load so the event is not missed.
    pub fn ready(&self, container_id: impl Into<String>) -> ContainerReady {
        ContainerReady::new(container_id.into(), self.events.subscribe())
    }

    /// How many times a container's scripts have been activated so far
    pub async fn activation_count(&self, container_id: &str) -> u32 {
        self.activations
            .lock()
            .await
            .get(container_id)
            .copied()
            .unwrap_or(0)
    }

    /// Load every fragment and activate the activation container
    pub async fn load_layout_components<D, I, R>(&self, document: &mut D, requests: I) -> LoadReport
    where
        D: Document + ?Sized,
        I: IntoIterator<Item = R>,
        R: Into<FragmentRequest>,
    {
        self.run(document, requests, LoadMode::InjectAndActivate).await
    }

    /// Load every fragment without running any scripts
    pub async fn load<D, I, R>(&self, document: &mut D, requests: I) -> LoadReport
    where
        D: Document + ?Sized,
        I: IntoIterator<Item = R>,
        R: Into<FragmentRequest>,
    {
        self.run(document, requests, LoadMode::Inject).await
    }

    /// Same as [`load_layout_components`](Self::load_layout_components)
    pub async fn load_and_activate<D, I, R>(&self, document: &mut D, requests: I) -> LoadReport
    where
        D: Document + ?Sized,
        I: IntoIterator<Item = R>,
        R: Into<FragmentRequest>,
    {
        self.run(document, requests, LoadMode::InjectAndActivate).await
    }

    /// Run one batch in the given mode
    pub async fn run<D, I, R>(&self, document: &mut D, requests: I, mode: LoadMode) -> LoadReport
    where
        D: Document + ?Sized,
        I: IntoIterator<Item = R>,
        R: Into<FragmentRequest>,
    {
        let requests: Vec<FragmentRequest> = requests.into_iter().map(Into::into).collect();
        let batch_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "load_batch",
            %batch_id,
            fragments = requests.len(),
            ?mode
        );

        self.run_batch(document, requests, mode, batch_id)
            .instrument(span)
            .await
    }

    async fn run_batch<D>(
        &self,
        document: &mut D,
        requests: Vec<FragmentRequest>,
        mode: LoadMode,
        batch_id: Uuid,
    ) -> LoadReport
    where
        D: Document + ?Sized,
    {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(requests.len());
        let mut pending = FuturesUnordered::new();

        tracing::debug!("Loading layout components");

        for request in requests {
            if !document.contains_container(&request.container_id) {
                let error = LoadError::missing_container(&request.container_id);
                outcomes.push(self.fail(batch_id, request, error));
                continue;
            }
            pending.push(self.fetch_fragment(request));
        }

        while let Some((request, result)) = pending.next().await {
            let outcome = match result {
                FragmentResult::Loaded(html) => {
                    self.inject(document, batch_id, request, html, mode).await
                }
                FragmentResult::Failed(error) => self.fail(batch_id, request, error),
            };
            outcomes.push(outcome);
        }

        let report = LoadReport {
            batch_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        let loaded = report.loaded().count();
        let failed = report.len() - loaded;
        tracing::info!(
            loaded,
            failed,
            elapsed_ms = report.elapsed_ms(),
            "Layout components settled"
        );
        self.emit(LoaderEvent::BatchSettled {
            batch_id,
            loaded,
            failed,
        });

        report
    }

    /// Fetch one fragment, bounded by the fetch timeout
    async fn fetch_fragment(&self, request: FragmentRequest) -> (FragmentRequest, FragmentResult) {
        let timeout = self.options.fetch_timeout;

        let result =
            match tokio::time::timeout(timeout, self.fetcher.fetch(&request.source_url)).await {
                Ok(result) => result,
                Err(_) => Err(LoadError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }),
            };

        (request, result.into())
    }

    async fn inject<D>(
        &self,
        document: &mut D,
        batch_id: Uuid,
        request: FragmentRequest,
        html: String,
        mode: LoadMode,
    ) -> ContainerOutcome
    where
        D: Document + ?Sized,
    {
        if let Err(error) = document.replace_contents(&request.container_id, &html) {
            return self.fail(batch_id, request, error);
        }

        tracing::debug!(
            container = %request.container_id,
            url = %request.source_url,
            bytes = html.len(),
            "Injected fragment"
        );

        let scripts_activated = if mode == LoadMode::InjectAndActivate
            && self.is_activation_container(&request.container_id)
        {
            Some(
                self.activate(document, batch_id, &request.container_id, &html)
                    .await,
            )
        } else {
            None
        };

        self.emit(LoaderEvent::ContainerLoaded {
            batch_id,
            container_id: request.container_id.clone(),
            bytes: html.len(),
        });

        ContainerOutcome::loaded(
            request,
            Injection {
                bytes: html.len(),
                scripts_activated,
            },
        )
    }

    /// Re-create the scripts of injected markup as live nodes, in order
    async fn activate<D>(
        &self,
        document: &mut D,
        batch_id: Uuid,
        container_id: &str,
        html: &str,
    ) -> usize
    where
        D: Document + ?Sized,
    {
        let activation = {
            let mut activations = self.activations.lock().await;
            let count = activations.entry(container_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if activation > 1 {
            tracing::warn!(
                container = %container_id,
                activation,
                "Activating scripts again; effects of earlier runs are not undone"
            );
        }

        let scripts = extract_scripts(html);
        let count = scripts.len();

        for script in scripts {
            let node = ScriptNode::from(script);
            tracing::trace!(
                container = %container_id,
                src = node.src.as_deref().unwrap_or("<inline>"),
                "Appending script node"
            );
            document.append_script(node);
        }

        tracing::debug!(container = %container_id, scripts = count, "Activated scripts");
        self.emit(LoaderEvent::ScriptsActivated {
            batch_id,
            container_id: container_id.to_string(),
            scripts: count,
            activation,
        });

        count
    }

    fn fail(&self, batch_id: Uuid, request: FragmentRequest, error: LoadError) -> ContainerOutcome {
        tracing::warn!(
            container = %request.container_id,
            url = %request.source_url,
            kind = error.kind(),
            error = %error,
            "Fragment not loaded; container left untouched"
        );

        self.emit(LoaderEvent::ContainerFailed {
            batch_id,
            container_id: request.container_id.clone(),
            source_url: request.source_url.clone(),
            reason: error.clone(),
        });

        ContainerOutcome::failed(request, error)
    }

    fn is_activation_container(&self, container_id: &str) -> bool {
        self.options.activation_container.as_deref() == Some(container_id)
    }

    fn emit(&self, event: LoaderEvent) {
        // No subscribers is the common case
        let _ = self.events.send(event);
    }
}
