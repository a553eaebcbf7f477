//! Staged image buffer
//!
//! Images produced while content is generated are collected here and only
//! shown when the user asks for the review. Requesting the review with
//! nothing staged emits a notice instead of opening an empty surface.

use crate::config::Settings;
use crate::notify::{Notification, Notifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// An image waiting for review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedImage {
    /// Image location
    pub url: String,
    /// Caption or alt text
    pub description: String,
    /// Intended placement in the document. Not unique, not contiguous.
    pub position: i64,
    /// When the image was staged
    pub staged_at: DateTime<Utc>,
}

impl StagedImage {
    /// Create an image staged now
    #[must_use]
    pub fn new(url: impl Into<String>, description: impl Into<String>, position: i64) -> Self {
        Self {
            url: url.into(),
            description: description.into(),
            position,
            staged_at: Utc::now(),
        }
    }
}

/// Result of [`ImageStagingBuffer::request_review`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The review surface is now visible
    Opened {
        /// Number of staged images
        count: usize,
    },
    /// Nothing staged; the user was notified and the surface stays hidden
    Empty,
}

#[derive(Debug, Default)]
struct StagingState {
    images: Vec<StagedImage>,
    review_open: bool,
}

/// Ordered buffer of staged images with an on-demand review surface
pub struct ImageStagingBuffer {
    state: Mutex<StagingState>,
    notifier: Arc<dyn Notifier>,
    empty_notice: Notification,
}

impl ImageStagingBuffer {
    /// Create an empty buffer reporting through `notifier`
    #[must_use]
    pub fn new(settings: &Settings, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Mutex::new(StagingState::default()),
            notifier,
            empty_notice: Notification::warning(
                settings.empty_review_title.clone(),
                settings.empty_review_description.clone(),
            ),
        }
    }

    fn state(&self) -> MutexGuard<'_, StagingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one image
    pub fn stage(&self, url: impl Into<String>, description: impl Into<String>, position: i64) {
        let image = StagedImage::new(url, description, position);
        debug!(url = %image.url, position = image.position, "Image staged");
        self.state().images.push(image);
    }

    /// Append several images in iteration order
    pub fn stage_all<I>(&self, images: I)
    where
        I: IntoIterator<Item = StagedImage>,
    {
        let mut state = self.state();
        let before = state.images.len();
        state.images.extend(images);
        debug!(added = state.images.len() - before, "Images staged");
    }

    /// Remove every staged image.
    ///
    /// An open review is closed, since it would otherwise show nothing.
    pub fn clear(&self) {
        let mut state = self.state();
        let removed = state.images.len();
        state.images.clear();
        state.review_open = false;
        debug!(removed, "Staging buffer cleared");
    }

    /// Open the review surface, or notify the user that nothing is staged
    pub fn request_review(&self) -> ReviewOutcome {
        let count = {
            let mut state = self.state();
            if !state.images.is_empty() {
                state.review_open = true;
            }
            state.images.len()
        };

        if count == 0 {
            info!("Review requested with no staged images");
            self.notifier.notify(self.empty_notice.clone());
            return ReviewOutcome::Empty;
        }

        info!(count, "Image review opened");
        ReviewOutcome::Opened { count }
    }

    /// Hide the review surface. Staged images are kept.
    pub fn close_review(&self) {
        self.state().review_open = false;
    }

    /// Whether the review surface is visible
    #[must_use]
    pub fn is_review_open(&self) -> bool {
        self.state().review_open
    }

    /// Staged images in insertion order
    #[must_use]
    pub fn images(&self) -> Vec<StagedImage> {
        self.state().images.clone()
    }

    /// Staged images sorted by placement position.
    ///
    /// Ties keep insertion order. The buffer itself is not reordered.
    #[must_use]
    pub fn placement_order(&self) -> Vec<StagedImage> {
        let mut images = self.images();
        images.sort_by_key(|image| image.position);
        images
    }

    /// Number of staged images
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().images.len()
    }

    /// Whether nothing is staged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().images.is_empty()
    }
}
