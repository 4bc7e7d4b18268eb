//! Loader completion events
//!
//! Downstream code (sidebar toggles, chart setup) needs to know when the
//! container it depends on has been filled. Rather than polling the page,
//! it subscribes to these events.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::fragment::LoadError;

/// Events published by the loader, in the order they happen
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoaderEvent {
    /// A container now holds its fragment (and, for the activation
    /// container, its scripts have already been appended)
    ContainerLoaded {
        batch_id: Uuid,
        container_id: String,
        bytes: usize,
    },
    /// A container was left untouched
    ContainerFailed {
        batch_id: Uuid,
        container_id: String,
        source_url: String,
        reason: LoadError,
    },
    /// Scripts of the activation container were appended to the body
    ScriptsActivated {
        batch_id: Uuid,
        container_id: String,
        scripts: usize,
        /// 1 on first activation of this container, higher on re-runs
        activation: u32,
    },
    /// Every request of the batch has settled
    BatchSettled {
        batch_id: Uuid,
        loaded: usize,
        failed: usize,
    },
}

impl LoaderEvent {
    pub fn batch_id(&self) -> Uuid {
        match self {
            LoaderEvent::ContainerLoaded { batch_id, .. }
            | LoaderEvent::ContainerFailed { batch_id, .. }
            | LoaderEvent::ScriptsActivated { batch_id, .. }
            | LoaderEvent::BatchSettled { batch_id, .. } => *batch_id,
        }
    }

    /// Container this event is about, if any
    pub fn container_id(&self) -> Option<&str> {
        match self {
            LoaderEvent::ContainerLoaded { container_id, .. }
            | LoaderEvent::ContainerFailed { container_id, .. }
            | LoaderEvent::ScriptsActivated { container_id, .. } => Some(container_id),
            LoaderEvent::BatchSettled { .. } => None,
        }
    }
}

/// Why waiting for a container did not end in a loaded container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadyError {
    #[error("Container {container_id} failed to load: {reason}")]
    Failed {
        container_id: String,
        reason: LoadError,
    },

    #[error("Batch settled without loading container {0}")]
    NotLoaded(String),

    #[error("Timed out waiting for container {0}")]
    Timeout(String),

    #[error("Loader event channel closed")]
    Closed,
}

/// Pending wait for one container to be filled
///
/// Created by [`LayoutLoader::ready`](super::LayoutLoader::ready). The
/// subscription starts at creation, so create it before starting the load.
/// Resolves against the next batch that settles.
pub struct ContainerReady {
    container_id: String,
    receiver: broadcast::Receiver<LoaderEvent>,
}

impl ContainerReady {
    pub(crate) fn new(container_id: String, receiver: broadcast::Receiver<LoaderEvent>) -> Self {
        Self {
            container_id,
            receiver,
        }
    }

    /// Wait until the container is loaded, fails, or `timeout` elapses
    pub async fn wait(mut self, timeout: Duration) -> Result<(), ReadyError> {
        let container_id = self.container_id.clone();
        match tokio::time::timeout(timeout, self.next_outcome()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ReadyError::Timeout(container_id)),
        }
    }

    async fn next_outcome(&mut self) -> Result<(), ReadyError> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        container = %self.container_id,
                        skipped,
                        "Readiness waiter lagged behind loader events"
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return Err(ReadyError::Closed),
            };

            match event {
                LoaderEvent::ContainerLoaded { container_id, .. }
                    if container_id == self.container_id =>
                {
                    return Ok(());
                }
                LoaderEvent::ContainerFailed {
                    container_id,
                    reason,
                    ..
                } if container_id == self.container_id => {
                    return Err(ReadyError::Failed {
                        container_id,
                        reason,
                    });
                }
                // Per-container events precede BatchSettled, so a settled
                // batch that never mentioned the container did not contain it
                LoaderEvent::BatchSettled { .. } => {
                    return Err(ReadyError::NotLoaded(self.container_id.clone()));
                }
                _ => {}
            }
        }
    }
}
