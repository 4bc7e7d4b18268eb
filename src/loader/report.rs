//! Batch load report

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::fragment::{FragmentRequest, LoadError};

/// What happened to a container whose fragment was injected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Injection {
    /// Size of the injected markup
    pub bytes: usize,
    /// Number of script nodes appended, when the container was activated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts_activated: Option<usize>,
}

/// Settled outcome of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerOutcome {
    pub container_id: String,
    pub source_url: String,
    #[serde(with = "outcome_result")]
    pub result: Result<Injection, LoadError>,
}

impl ContainerOutcome {
    pub(crate) fn loaded(request: FragmentRequest, injection: Injection) -> Self {
        Self {
            container_id: request.container_id,
            source_url: request.source_url,
            result: Ok(injection),
        }
    }

    pub(crate) fn failed(request: FragmentRequest, error: LoadError) -> Self {
        Self {
            container_id: request.container_id,
            source_url: request.source_url,
            result: Err(error),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.result.as_ref().err()
    }
}

/// Result of one loader invocation; every request appears exactly once
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Outcomes in settlement order
    pub outcomes: Vec<ContainerOutcome>,
}

impl LoadReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn loaded(&self) -> impl Iterator<Item = &ContainerOutcome> {
        self.outcomes.iter().filter(|o| o.is_loaded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ContainerOutcome> {
        self.outcomes.iter().filter(|o| !o.is_loaded())
    }

    /// True when every request injected its fragment
    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(ContainerOutcome::is_loaded)
    }

    /// Last settled outcome for a container
    pub fn outcome(&self, container_id: &str) -> Option<&ContainerOutcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|o| o.container_id == container_id)
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Serializes `Result<Injection, LoadError>` as `{"status": "loaded", ...}`
/// or `{"status": "failed", "error": {...}}`
mod outcome_result {
    use super::{Injection, LoadError};
    use serde::{Serialize, Serializer};

    #[derive(Serialize)]
    #[serde(tag = "status", rename_all = "snake_case")]
    enum Repr<'a> {
        Loaded {
            bytes: usize,
            #[serde(skip_serializing_if = "Option::is_none")]
            scripts_activated: Option<usize>,
        },
        Failed {
            error: &'a LoadError,
        },
    }

    pub fn serialize<S: Serializer>(
        result: &Result<Injection, LoadError>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match result {
            Ok(injection) => Repr::Loaded {
                bytes: injection.bytes,
                scripts_activated: injection.scripts_activated,
            },
            Err(error) => Repr::Failed { error },
        }
        .serialize(serializer)
    }
}
