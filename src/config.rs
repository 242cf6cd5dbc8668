//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the app runtime.
//!
//! Config is used in three ways:
//! 1. **App creation**: `App::builder(config)`
//! 2. **ServiceSpec defaults**: `ServiceSpec::with_defaults(name, workload, &config)`
//! 3. **Query defaults**: journal page size, default key-value namespace
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for services on shutdown
//! - `journal_page_size = 0` → clamped to 1

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for the app runtime.
///
/// ## Field semantics
/// - `grace`: Maximum wait for services to stop on shutdown
/// - `restart`: Default restart flag for new services
/// - `autostart`: Default autostart flag for new services
/// - `restart_delay`: Default delay between runs of a restarting service
/// - `backoff`: Default growth of the delay after consecutive failures (`None` = constant)
/// - `journal_page_size`: Number of journal headlines per history page
/// - `kv_namespace`: Namespace of the default key-value accessor
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for running services after cancellation.
    pub grace: Duration,

    /// Default restart flag.
    pub restart: bool,

    /// Default autostart flag.
    pub autostart: bool,

    /// Default delay before a service is relaunched.
    pub restart_delay: Duration,

    /// Default backoff applied on top of `restart_delay` after failed runs.
    pub backoff: Option<BackoffPolicy>,

    /// Journal headlines per page.
    pub journal_page_size: usize,

    /// Namespace used by `App::kv`.
    pub kv_namespace: String,
}

impl Config {
    /// Returns the journal page size clamped to a minimum of 1.
    #[inline]
    pub fn journal_limit(&self) -> usize {
        self.journal_page_size.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 5s`
    /// - `restart = true`, `autostart = true`
    /// - `restart_delay = 3s`
    /// - `backoff = None` (constant delay)
    /// - `journal_page_size = 20`
    /// - `kv_namespace = "default"`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            restart: true,
            autostart: true,
            restart_delay: Duration::from_secs(3),
            backoff: None,
            journal_page_size: 20,
            kv_namespace: "default".to_string(),
        }
    }
}
