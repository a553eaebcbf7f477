//! User notification sinks
//!
//! Fire-and-forget, toast-style messages. Delivery is never awaited or
//! acknowledged; a sink may drop messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tracing::{error, info, warn};

/// Severity of a user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Neutral information
    Info,
    /// Operation succeeded
    Success,
    /// Non-fatal problem the user should know about
    Warning,
    /// Operation failed
    Error,
}

/// A user-visible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short headline
    pub title: String,
    /// Longer explanation
    pub description: String,
    /// Severity
    pub severity: Severity,
}

impl Notification {
    /// Create a new notification
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }

    /// Create a warning notification
    #[must_use]
    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Warning)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// One-way notification sink
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Emit a notification. Never blocks and never reports failure.
    fn notify(&self, notification: Notification);
}

/// Errors that can occur when handing a notification to a channel
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NotifyError {
    /// The queue is full
    #[error("notification queue is full")]
    Full,
    /// The receiving side has been dropped
    #[error("notification channel closed")]
    Closed,
}

/// Notifier backed by a bounded tokio channel
///
/// The host UI drains the receiver and renders toasts.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver the host drains
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Try to enqueue without blocking
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Full` when the queue is at capacity and
    /// `NotifyError::Closed` when the receiver is gone.
    pub fn try_deliver(&self, notification: Notification) -> Result<(), NotifyError> {
        self.tx.try_send(notification).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::Full,
            TrySendError::Closed(_) => NotifyError::Closed,
        })
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        let title = notification.title.clone();
        if let Err(e) = self.try_deliver(notification) {
            warn!(title = %title, error = %e, "Notification dropped");
        }
    }
}

/// Notifier that only writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info | Severity::Success => {
                info!(title = %notification.title, "{}", notification.description);
            }
            Severity::Warning => {
                warn!(title = %notification.title, "{}", notification.description);
            }
            Severity::Error => {
                error!(title = %notification.title, "{}", notification.description);
            }
        }
    }
}
