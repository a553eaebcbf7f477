#![deny(missing_docs)]
//! Oxide Studio generation controls.
//!
//! Coordination layer between the studio UI and the generation pipelines:
//! topic confirmation, unified cancellation and image staging.

/// Reset broadcast to registered listeners.
pub mod broadcast;
/// Configuration management.
pub mod config;
/// Unified cancellation across generation pipelines.
pub mod controller;
/// Topic confirmation gate.
pub mod gate;
/// Tracing subscriber setup.
pub mod logging;
/// User notification sinks.
pub mod notify;
/// Generation run handles.
pub mod pipeline;
/// Staged image buffer and review surface.
pub mod staging;
/// Composition of all controls for a host.
pub mod studio;

pub use broadcast::{ListenerId, ResetBroadcast, ResetListener};
pub use crate::config::Settings;
pub use controller::{CancellationController, SessionResetHandler, StopReport};
pub use gate::{ConfirmOutcome, ConfirmationHandler, GatePhase, TopicGate};
pub use notify::{ChannelNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use pipeline::{GenerationRun, PipelineKind, RunHandle};
pub use staging::{ImageStagingBuffer, ReviewOutcome, StagedImage};
pub use studio::Studio;
