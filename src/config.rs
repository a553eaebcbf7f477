//! Configuration and settings management
//!
//! Loads studio settings from config files and environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Default title of the notice shown when the review is requested on an empty buffer
pub const DEFAULT_EMPTY_REVIEW_TITLE: &str = "No images to review";
/// Default description of the empty review notice
pub const DEFAULT_EMPTY_REVIEW_DESCRIPTION: &str =
    "Generate content with images first, then open the review again.";
/// Default bound of the notification queue
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 32;

/// Studio settings loaded from env/files.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Title of the "no images" notice
    #[serde(default = "default_empty_review_title")]
    pub empty_review_title: String,

    /// Description of the "no images" notice
    #[serde(default = "default_empty_review_description")]
    pub empty_review_description: String,

    /// Capacity of the channel-backed notifier
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

fn default_empty_review_title() -> String {
    DEFAULT_EMPTY_REVIEW_TITLE.to_string()
}

fn default_empty_review_description() -> String {
    DEFAULT_EMPTY_REVIEW_DESCRIPTION.to_string()
}

const fn default_notification_capacity() -> usize {
    DEFAULT_NOTIFICATION_CAPACITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            empty_review_title: default_empty_review_title(),
            empty_review_description: default_empty_review_description(),
            notification_capacity: default_notification_capacity(),
        }
    }
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// Priority: `STUDIO__*` env vars → `config/local` → `config/{RUN_MODE}` →
    /// `config/default` → built-in defaults.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use oxide_studio::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a present source cannot be parsed.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg. `STUDIO__NOTIFICATION_CAPACITY=8`
            .add_source(
                Environment::with_prefix("STUDIO")
                    .prefix_separator("__")
                    .separator("__")
                    .ignore_empty(true),
            )
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        if settings.notification_capacity == 0 {
            // tokio's bounded channel rejects a zero capacity
            settings.notification_capacity = 1;
        }

        Ok(settings)
    }
}
