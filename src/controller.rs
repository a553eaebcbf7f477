//! Unified cancellation controller
//!
//! Batch and single-article generation run independently and may overlap.
//! The controller keeps the latest run handle of each pipeline and gives
//! the UI one stop control for both, plus the session reset sequence.

use crate::broadcast::ResetBroadcast;
use crate::pipeline::{PipelineKind, RunHandle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Clears the host's session state
#[cfg_attr(test, mockall::automock)]
pub trait SessionResetHandler: Send + Sync {
    /// Reset the session. Errors are returned to the caller unchanged.
    fn reset(&self) -> anyhow::Result<()>;
}

/// Which pipelines received a stop request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopReport {
    /// Batch generation was asked to stop
    pub batch: bool,
    /// Single article generation was asked to stop
    pub single: bool,
}

impl StopReport {
    /// Whether any pipeline was asked to stop
    #[must_use]
    pub const fn any(&self) -> bool {
        self.batch || self.single
    }
}

#[derive(Debug, Default)]
struct Runs {
    batch: Option<RunHandle>,
    single: Option<RunHandle>,
}

impl Runs {
    fn slot(&mut self, kind: PipelineKind) -> &mut Option<RunHandle> {
        match kind {
            PipelineKind::Batch => &mut self.batch,
            PipelineKind::Single => &mut self.single,
        }
    }
}

/// One stop control for both generation pipelines
pub struct CancellationController {
    runs: Mutex<Runs>,
    broadcast: Arc<ResetBroadcast>,
    reset_handler: Arc<dyn SessionResetHandler>,
}

impl CancellationController {
    /// Create a controller with no tracked runs
    #[must_use]
    pub fn new(broadcast: Arc<ResetBroadcast>, reset_handler: Arc<dyn SessionResetHandler>) -> Self {
        Self {
            runs: Mutex::new(Runs::default()),
            broadcast,
            reset_handler,
        }
    }

    fn runs(&self) -> MutexGuard<'_, Runs> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track the handle of a run that just started.
    ///
    /// Replaces the previous handle of the same pipeline.
    pub fn track(&self, handle: RunHandle) {
        let kind = handle.kind();
        let run_id = handle.id();
        if let Some(previous) = self.runs().slot(kind).replace(handle) {
            if previous.is_active() {
                debug!(kind = %kind, previous = %previous.id(), "Replacing handle of a run still active");
            }
        }
        debug!(kind = %kind, run_id = %run_id, "Tracking generation run");
    }

    /// Whether the given pipeline is generating
    #[must_use]
    pub fn is_generating(&self, kind: PipelineKind) -> bool {
        self.runs()
            .slot(kind)
            .as_ref()
            .is_some_and(RunHandle::is_active)
    }

    /// Whether any pipeline is generating
    #[must_use]
    pub fn any_generating(&self) -> bool {
        self.is_generating(PipelineKind::Batch) || self.is_generating(PipelineKind::Single)
    }

    /// Ask every active pipeline to stop.
    ///
    /// Inactive or untracked pipelines are left alone. Does not wait for
    /// the pipelines to halt.
    pub fn stop_all(&self) -> StopReport {
        let mut runs = self.runs();
        let report = StopReport {
            batch: stop_if_active(runs.slot(PipelineKind::Batch).as_ref()),
            single: stop_if_active(runs.slot(PipelineKind::Single).as_ref()),
        };
        drop(runs);

        if report.any() {
            info!(batch = report.batch, single = report.single, "Stop requested");
        } else {
            debug!("Stop requested with no active generation");
        }
        report
    }

    /// Announce the reset to listeners, then run the session reset handler.
    ///
    /// # Errors
    ///
    /// Returns the reset handler's error unchanged.
    pub fn reset_session(&self) -> anyhow::Result<()> {
        let notified = self.broadcast.broadcast();
        info!(listeners = notified, "Session reset broadcast");
        self.reset_handler.reset()
    }
}

fn stop_if_active(handle: Option<&RunHandle>) -> bool {
    handle.is_some_and(RunHandle::request_stop)
}
