//! # Service specification.
//!
//! [`ServiceSpec`] bundles everything the supervisor needs to register a service:
//! the name, a description, the workload and its restart policy.
//!
//! A spec can be created:
//! - **Explicitly** with [`ServiceSpec::new`] plus `with_*` modifiers
//! - **From config** with [`ServiceSpec::with_defaults`] (inherit defaults)
//! - **Fluently** with [`ServiceSpec::builder`] from a closure

use std::borrow::Cow;
use std::future::Future;
use std::panic::Location;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::WorkloadError;
use crate::policies::BackoffPolicy;
use crate::services::workload::{WorkloadFn, WorkloadRef};

/// Default delay between runs when nothing else is configured.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(3);

/// Specification for registering a supervised service.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use binp::{ServiceSpec, WorkloadError};
///
/// let spec = ServiceSpec::builder("poller")
///     .with_description("Polls the upstream feed")
///     .with_restart_delay(Duration::from_secs(10))
///     .build(|_ctx: CancellationToken| async move { Ok::<_, WorkloadError>(()) });
///
/// assert_eq!(spec.name(), "poller");
/// assert!(spec.restart());
/// assert!(spec.autostart());
/// ```
#[derive(Clone)]
pub struct ServiceSpec {
    name: String,
    description: String,
    workload: WorkloadRef,
    restart: bool,
    autostart: bool,
    restart_delay: Duration,
    backoff: Option<BackoffPolicy>,
}

impl ServiceSpec {
    /// Creates a spec with `restart = true`, `autostart = true` and a 3s delay.
    pub fn new(name: impl Into<String>, workload: WorkloadRef) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            workload,
            restart: true,
            autostart: true,
            restart_delay: DEFAULT_RESTART_DELAY,
            backoff: None,
        }
    }

    /// Creates a spec inheriting restart/autostart/delay/backoff from `cfg`.
    pub fn with_defaults(name: impl Into<String>, workload: WorkloadRef, cfg: &Config) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            workload,
            restart: cfg.restart,
            autostart: cfg.autostart,
            restart_delay: cfg.restart_delay,
            backoff: cfg.backoff,
        }
    }

    /// Starts a fluent builder.
    pub fn builder(name: impl Into<Cow<'static, str>>) -> ServiceSpecBuilder {
        ServiceSpecBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn workload(&self) -> &WorkloadRef {
        &self.workload
    }

    pub fn restart(&self) -> bool {
        self.restart
    }

    pub fn autostart(&self) -> bool {
        self.autostart
    }

    pub fn restart_delay(&self) -> Duration {
        self.restart_delay
    }

    pub fn backoff(&self) -> Option<BackoffPolicy> {
        self.backoff
    }

    /// Returns a new spec with the given description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns a new spec with the given restart flag.
    pub fn with_restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    /// Returns a new spec with the given autostart flag.
    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    /// Returns a new spec with the given restart delay.
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Returns a new spec with the given failure backoff (`None` disables it).
    pub fn with_backoff(mut self, backoff: impl Into<Option<BackoffPolicy>>) -> Self {
        self.backoff = backoff.into();
        self
    }
}

impl std::fmt::Debug for ServiceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSpec")
            .field("name", &self.name)
            .field("workload", &self.workload.label())
            .field("restart", &self.restart)
            .field("autostart", &self.autostart)
            .field("restart_delay", &self.restart_delay)
            .finish()
    }
}

/// Builder for [`ServiceSpec`] with a fluent API.
#[derive(Clone, Debug)]
pub struct ServiceSpecBuilder {
    name: Cow<'static, str>,
    label: Option<Cow<'static, str>>,
    description: String,
    restart: bool,
    autostart: bool,
    restart_delay: Duration,
    backoff: Option<BackoffPolicy>,
}

impl ServiceSpecBuilder {
    /// Creates a builder for the service `name`.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: String::new(),
            restart: true,
            autostart: true,
            restart_delay: DEFAULT_RESTART_DELAY,
            backoff: None,
        }
    }

    /// Label of the workload built by [`ServiceSpecBuilder::build`].
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: impl Into<Option<BackoffPolicy>>) -> Self {
        self.backoff = backoff.into();
        self
    }

    /// Builds the spec from a closure.
    ///
    /// Without [`ServiceSpecBuilder::with_label`] the workload is labelled with
    /// the closure type and the call site, e.g.
    /// `app::main::{{closure}} at src/main.rs:12:10`, so two registrations
    /// under one name stay distinguishable in logs.
    #[track_caller]
    pub fn build<F, Fut>(mut self, f: F) -> ServiceSpec
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), WorkloadError>> + Send + 'static,
    {
        let caller = Location::caller();
        let label = self
            .label
            .take()
            .unwrap_or_else(|| closure_label::<F>(caller).into());
        let workload = WorkloadFn::arc(label, f);
        self.build_from_workload(workload)
    }

    /// Builds the spec from an existing workload.
    pub fn build_from_workload(self, workload: WorkloadRef) -> ServiceSpec {
        ServiceSpec {
            name: self.name.into_owned(),
            description: self.description,
            workload,
            restart: self.restart,
            autostart: self.autostart,
            restart_delay: self.restart_delay,
            backoff: self.backoff,
        }
    }
}

/// Closure type name plus the location it was handed over at.
pub(crate) fn closure_label<F>(location: &Location<'_>) -> String {
    format!("{} at {location}", std::any::type_name::<F>())
}
