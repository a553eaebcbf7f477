//! Generation run handles
//!
//! A pipeline starts a [`GenerationRun`] when it begins work and hands the
//! matching [`RunHandle`] to the cancellation controller. The run owns the
//! activity state: only finishing or dropping it marks the pipeline idle.
//! The handle can only observe that state and request a stop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;
use uuid::Uuid;

/// The two independent generation pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// One-click batch generation
    Batch,
    /// Single article generation
    Single,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch => f.write_str("batch"),
            Self::Single => f.write_str("single"),
        }
    }
}

#[derive(Debug)]
struct RunShared {
    id: Uuid,
    kind: PipelineKind,
    started_at: DateTime<Utc>,
    token: CancellationToken,
    finished: AtomicBool,
}

/// Pipeline side of a run
///
/// Dropping the run marks it finished.
#[derive(Debug)]
pub struct GenerationRun {
    shared: Arc<RunShared>,
}

impl GenerationRun {
    /// Start a new run and return it with the handle for the controller
    #[must_use]
    pub fn start(kind: PipelineKind) -> (Self, RunHandle) {
        let shared = Arc::new(RunShared {
            id: Uuid::new_v4(),
            kind,
            started_at: Utc::now(),
            token: CancellationToken::new(),
            finished: AtomicBool::new(false),
        });
        debug!(run_id = %shared.id, kind = %kind, "Generation run started");
        (
            Self {
                shared: shared.clone(),
            },
            RunHandle { shared },
        )
    }

    /// Run identifier
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Pipeline this run belongs to
    #[must_use]
    pub fn kind(&self) -> PipelineKind {
        self.shared.kind
    }

    /// Token the pipeline should watch, e.g. in a `tokio::select!`
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.shared.token
    }

    /// Resolves once a stop has been requested
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.shared.token.cancelled()
    }

    /// Whether a stop has been requested
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Mark the run as finished
    pub fn finish(self) {
        // Drop does the work
    }
}

impl Drop for GenerationRun {
    fn drop(&mut self) {
        if !self.shared.finished.swap(true, Ordering::AcqRel) {
            debug!(
                run_id = %self.shared.id,
                kind = %self.shared.kind,
                stopped = self.shared.token.is_cancelled(),
                "Generation run finished"
            );
        }
    }
}

/// Controller side of a run
#[derive(Debug, Clone)]
pub struct RunHandle {
    shared: Arc<RunShared>,
}

impl RunHandle {
    /// Run identifier
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Pipeline this run belongs to
    #[must_use]
    pub fn kind(&self) -> PipelineKind {
        self.shared.kind
    }

    /// When the run started
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.shared.started_at
    }

    /// Whether the pipeline is still working on this run.
    ///
    /// A run that was asked to stop stays active until the pipeline
    /// actually finishes it.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.shared.finished.load(Ordering::Acquire)
    }

    /// Whether a stop has been requested
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Request a stop. Returns `false` without touching the token when the
    /// run has already finished.
    pub fn request_stop(&self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.shared.token.cancel();
        true
    }
}
