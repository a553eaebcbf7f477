//! Topic confirmation gate
//!
//! Selecting a topic starts generation, which cannot be undone. The gate
//! holds the selected topic pending until the user confirms it, then
//! forwards it to the [`ConfirmationHandler`].
//!
//! ```text
//! Idle --select--> Pending --confirm--> Confirming --ok--> Idle
//!                     |                     |
//!                     +--cancel--> Idle     +--err--> Pending
//! ```

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Receives a topic once the user has confirmed it
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfirmationHandler: Send + Sync {
    /// Start whatever the confirmed topic triggers.
    ///
    /// The gate returns the error from this call to its caller unchanged.
    async fn confirm(&self, topic: &str) -> anyhow::Result<()>;
}

/// Observable phase of the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum GatePhase {
    /// Nothing pending, dialog hidden
    Idle,
    /// Topic waiting for confirmation, dialog visible
    Pending {
        /// Selected topic
        topic: String,
    },
    /// Topic is being forwarded to the handler
    Confirming {
        /// Topic in flight
        topic: String,
    },
}

/// Result of a [`TopicGate::confirm`] call that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The handler accepted the topic
    Confirmed(String),
    /// No topic was pending; nothing was forwarded
    NothingPending,
    /// The pending topic is already being forwarded; nothing was forwarded
    AlreadyConfirming,
}

#[derive(Debug, Default)]
struct GateState {
    pending: Option<String>,
    dialog_open: bool,
    /// Bumped by every select and cancel
    cycle: u64,
    /// Cycle whose topic is being forwarded
    in_flight: Option<u64>,
}

/// Holds a selected topic until it is explicitly confirmed or cancelled
pub struct TopicGate {
    handler: Arc<dyn ConfirmationHandler>,
    state: Mutex<GateState>,
}

impl TopicGate {
    /// Create an idle gate forwarding to `handler`
    #[must_use]
    pub fn new(handler: Arc<dyn ConfirmationHandler>) -> Self {
        Self {
            handler,
            state: Mutex::new(GateState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hold `topic` pending and show the confirmation dialog.
    ///
    /// Overwrites any topic already pending.
    pub fn select(&self, topic: impl Into<String>) {
        let topic = topic.into();
        let mut state = self.state();
        if let Some(previous) = state.pending.replace(topic.clone()) {
            debug!(previous = %previous, topic = %topic, "Pending topic replaced");
        }
        state.dialog_open = true;
        state.cycle = state.cycle.wrapping_add(1);
        info!(topic = %topic, "Topic awaiting confirmation");
    }

    /// Forward the pending topic to the confirmation handler.
    ///
    /// Returns `NothingPending` without calling the handler when no topic
    /// is pending, and `AlreadyConfirming` while the pending topic is already
    /// being forwarded. A forward left over from a cancelled or replaced
    /// selection does not block confirming the new one. On success the
    /// pending topic is cleared unless the user selected or cancelled in the
    /// meantime.
    ///
    /// # Errors
    ///
    /// Returns the handler's error unchanged. The topic stays pending so
    /// the caller can retry.
    pub async fn confirm(&self) -> anyhow::Result<ConfirmOutcome> {
        let (topic, cycle) = {
            let mut state = self.state();
            if state.in_flight == Some(state.cycle) {
                debug!("Confirm ignored, topic already being forwarded");
                return Ok(ConfirmOutcome::AlreadyConfirming);
            }
            let Some(topic) = state.pending.clone() else {
                debug!("Confirm ignored, no pending topic");
                return Ok(ConfirmOutcome::NothingPending);
            };
            state.in_flight = Some(state.cycle);
            (topic, state.cycle)
        };

        let _in_flight = InFlightGuard { gate: self, cycle };
        info!(topic = %topic, "Forwarding confirmed topic");
        let result = self.handler.confirm(&topic).await;

        let mut state = self.state();
        match result {
            Ok(()) => {
                if state.cycle == cycle {
                    state.pending = None;
                    state.dialog_open = false;
                    state.cycle = state.cycle.wrapping_add(1);
                } else {
                    debug!(topic = %topic, "Gate changed during confirmation, keeping newer state");
                }
                info!(topic = %topic, "Topic confirmed");
                Ok(ConfirmOutcome::Confirmed(topic))
            }
            Err(e) => {
                warn!(topic = %topic, error = %e, "Confirmation failed, topic kept pending");
                Err(e)
            }
        }
    }

    /// Drop the pending topic and hide the dialog, whatever the phase.
    pub fn cancel(&self) {
        let mut state = self.state();
        let dropped = state.pending.take();
        state.dialog_open = false;
        state.cycle = state.cycle.wrapping_add(1);
        if let Some(topic) = dropped {
            info!(topic = %topic, "Topic selection cancelled");
        }
    }

    /// Dialog open-state callback. Closing the dialog cancels.
    ///
    /// Opening is ignored: only [`select`](Self::select) opens the dialog.
    pub fn on_dialog_open_change(&self, open: bool) {
        if !open {
            self.cancel();
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> GatePhase {
        let state = self.state();
        match (&state.pending, state.in_flight) {
            (Some(topic), Some(cycle)) if cycle == state.cycle => GatePhase::Confirming {
                topic: topic.clone(),
            },
            (Some(topic), _) => GatePhase::Pending {
                topic: topic.clone(),
            },
            (None, _) => GatePhase::Idle,
        }
    }

    /// Topic waiting for confirmation, if any
    #[must_use]
    pub fn pending_topic(&self) -> Option<String> {
        self.state().pending.clone()
    }

    /// Whether the confirmation dialog is visible
    #[must_use]
    pub fn is_dialog_open(&self) -> bool {
        self.state().dialog_open
    }
}

/// Clears the in-flight marker even if the confirm future is dropped
struct InFlightGuard<'a> {
    gate: &'a TopicGate,
    cycle: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.gate.state();
        // A newer forward may own the marker by now
        if state.in_flight == Some(self.cycle) {
            state.in_flight = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn gate_with(mock: MockConfirmationHandler) -> TopicGate {
        TopicGate::new(Arc::new(mock))
    }

    #[test]
    fn test_last_select_wins() {
        let gate = gate_with(MockConfirmationHandler::new());
        gate.select("wind power");
        gate.select("solar energy");

        assert_eq!(gate.pending_topic().as_deref(), Some("solar energy"));
        assert!(gate.is_dialog_open());
        assert_eq!(
            gate.phase(),
            GatePhase::Pending {
                topic: "solar energy".into()
            }
        );
    }

    #[tokio::test]
    async fn test_confirm_when_idle_is_noop() -> anyhow::Result<()> {
        let mut mock = MockConfirmationHandler::new();
        mock.expect_confirm().never();
        let gate = gate_with(mock);

        assert_eq!(gate.confirm().await?, ConfirmOutcome::NothingPending);
        assert_eq!(gate.phase(), GatePhase::Idle);
        assert!(!gate.is_dialog_open());
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_success_clears_pending() -> anyhow::Result<()> {
        let mut mock = MockConfirmationHandler::new();
        mock.expect_confirm()
            .with(eq("solar energy"))
            .times(1)
            .returning(|_| Ok(()));
        let gate = gate_with(mock);

        gate.select("solar energy");
        let outcome = gate.confirm().await?;

        assert_eq!(outcome, ConfirmOutcome::Confirmed("solar energy".into()));
        assert_eq!(gate.pending_topic(), None);
        assert!(!gate.is_dialog_open());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_confirm_keeps_topic_and_retries() -> anyhow::Result<()> {
        let mut seq = Sequence::new();
        let mut mock = MockConfirmationHandler::new();
        mock.expect_confirm()
            .with(eq("solar energy"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow::anyhow!("backend unavailable")));
        mock.expect_confirm()
            .with(eq("solar energy"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let gate = gate_with(mock);

        gate.select("solar energy");
        let Err(err) = gate.confirm().await else {
            panic!("expected handler failure");
        };
        assert_eq!(err.to_string(), "backend unavailable");
        assert_eq!(gate.pending_topic().as_deref(), Some("solar energy"));
        assert!(gate.is_dialog_open());

        let outcome = gate.confirm().await?;
        assert_eq!(outcome, ConfirmOutcome::Confirmed("solar energy".into()));
        assert_eq!(gate.phase(), GatePhase::Idle);
        Ok(())
    }

    #[test]
    fn test_cancel_from_any_phase() {
        let gate = gate_with(MockConfirmationHandler::new());

        gate.cancel();
        assert_eq!(gate.phase(), GatePhase::Idle);

        gate.select("tides");
        gate.cancel();
        assert_eq!(gate.pending_topic(), None);
        assert!(!gate.is_dialog_open());
    }

    #[test]
    fn test_dialog_close_cancels_and_open_is_ignored() {
        let gate = gate_with(MockConfirmationHandler::new());

        gate.on_dialog_open_change(true);
        assert!(!gate.is_dialog_open());

        gate.select("geothermal");
        gate.on_dialog_open_change(false);
        assert_eq!(gate.phase(), GatePhase::Idle);
        assert!(!gate.is_dialog_open());
    }

    #[test]
    fn test_phase_serializes_tagged() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&GatePhase::Pending {
            topic: "tides".into(),
        })?;
        assert_eq!(json, r#"{"phase":"pending","topic":"tides"}"#);
        Ok(())
    }
}
