//! Studio controls
//!
//! Builds the gate, the cancellation controller and the staging buffer for
//! one editor session from shared collaborators.

use crate::broadcast::ResetBroadcast;
use crate::config::Settings;
use crate::controller::{CancellationController, SessionResetHandler};
use crate::gate::{ConfirmationHandler, TopicGate};
use crate::notify::Notifier;
use crate::staging::ImageStagingBuffer;
use std::sync::Arc;

/// All generation controls of one editor session
pub struct Studio {
    gate: TopicGate,
    controller: CancellationController,
    broadcast: Arc<ResetBroadcast>,
    staging: ImageStagingBuffer,
}

impl Studio {
    /// Wire the controls together
    #[must_use]
    pub fn new(
        settings: &Settings,
        confirmation_handler: Arc<dyn ConfirmationHandler>,
        reset_handler: Arc<dyn SessionResetHandler>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let broadcast = Arc::new(ResetBroadcast::new());
        Self {
            gate: TopicGate::new(confirmation_handler),
            controller: CancellationController::new(broadcast.clone(), reset_handler),
            broadcast,
            staging: ImageStagingBuffer::new(settings, notifier),
        }
    }

    /// Topic confirmation gate
    #[must_use]
    pub const fn gate(&self) -> &TopicGate {
        &self.gate
    }

    /// Stop and reset control
    #[must_use]
    pub const fn controller(&self) -> &CancellationController {
        &self.controller
    }

    /// Reset listeners registry
    #[must_use]
    pub fn reset_broadcast(&self) -> &Arc<ResetBroadcast> {
        &self.broadcast
    }

    /// Staged image buffer
    #[must_use]
    pub const fn staging(&self) -> &ImageStagingBuffer {
        &self.staging
    }
}
