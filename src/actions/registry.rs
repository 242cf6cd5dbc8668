//! # Actions: named on-demand operations.
//!
//! An action is a user function exposed for manual invocation (a button in a
//! UI, a command in a chat bot). Actions are indexed by name; registering a name
//! twice keeps the latest handler in the original position and logs a warning.
//!
//! Actions are not journaled automatically. Wrap the body in
//! [`Journals::trace`](crate::Journals::trace) to record invocations.

use std::borrow::Cow;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ActionError;
use crate::services::closure_label;

/// Body of an action.
#[async_trait]
pub trait ActionHandler: Send + Sync + 'static {
    async fn invoke(&self) -> anyhow::Result<()>;

    /// Identity of the handler, logged when an action is redefined.
    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Closure-backed [`ActionHandler`].
pub struct ActionFn<F> {
    label: String,
    f: F,
}

impl<F> ActionFn<F> {
    /// Wraps `f`, labelled with the closure type and the call site.
    #[track_caller]
    pub fn new(f: F) -> Self {
        Self {
            label: closure_label::<F>(Location::caller()),
            f,
        }
    }

    /// Replaces the derived label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl<F, Fut> ActionHandler for ActionFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn invoke(&self) -> anyhow::Result<()> {
        (self.f)().await
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Public description of a registered action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub name: String,
    pub description: String,
}

struct Entry {
    info: ActionInfo,
    handler: Arc<dyn ActionHandler>,
}

/// Registry of actions. Cloning is cheap; clones share the registry.
///
/// ## Example
/// ```rust
/// use binp::Actions;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), binp::ActionError> {
/// let actions = Actions::new();
/// actions.register("flush-cache", "Drops cached quotes", || async {
///     Ok::<_, anyhow::Error>(())
/// });
///
/// assert!(actions.invoke("flush-cache").await?);
/// assert!(!actions.invoke("unknown").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Actions {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl Actions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure as the action `name`.
    #[track_caller]
    pub fn register<F, Fut>(&self, name: impl Into<Cow<'static, str>>, description: impl Into<String>, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register_handler(name, description, Arc::new(ActionFn::new(f)));
    }

    /// Registers a handler as the action `name`; the latest registration wins.
    pub fn register_handler(
        &self,
        name: impl Into<Cow<'static, str>>,
        description: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) {
        let info = ActionInfo {
            name: name.into().into_owned(),
            description: description.into(),
        };
        let mut entries = self.entries.write();

        match entries.iter_mut().find(|e| e.info.name == info.name) {
            Some(existing) => {
                warn!(
                    action = %info.name,
                    old = %existing.handler.label(),
                    new = %handler.label(),
                    "redefining action"
                );
                *existing = Entry { info, handler };
            }
            None => entries.push(Entry { info, handler }),
        }
    }

    /// Invokes the action `name`.
    ///
    /// Returns `Ok(false)` for an unknown name. Handler errors are returned, not
    /// swallowed.
    pub async fn invoke(&self, name: &str) -> Result<bool, ActionError> {
        let handler = {
            let entries = self.entries.read();
            entries
                .iter()
                .find(|e| e.info.name == name)
                .map(|e| Arc::clone(&e.handler))
        };
        let Some(handler) = handler else {
            warn!(action = %name, "attempt to invoke unknown action");
            return Ok(false);
        };

        debug!(action = %name, "invoking action");
        handler.invoke().await.map_err(|source| ActionError::Failed {
            name: name.to_string(),
            source,
        })?;
        Ok(true)
    }

    /// Registered actions in registration order.
    pub fn actions(&self) -> Vec<ActionInfo> {
        self.entries.read().iter().map(|e| e.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Actions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actions").field("actions", &self.actions()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn redefinition_keeps_position() {
        let actions = Actions::new();
        actions.register("a", "first", || async { Ok::<_, anyhow::Error>(()) });
        actions.register("b", "", || async { Ok::<_, anyhow::Error>(()) });
        actions.register("a", "second", || async { Err::<(), _>(anyhow::anyhow!("replaced")) });

        assert_eq!(
            actions.actions(),
            vec![
                ActionInfo {
                    name: "a".into(),
                    description: "second".into()
                },
                ActionInfo {
                    name: "b".into(),
                    description: String::new()
                },
            ]
        );
        let err = actions.invoke("a").await.expect_err("latest handler runs");
        assert_eq!(err.as_label(), "action_failed");
    }

    #[test]
    fn redefinition_replaces_handler_identity() {
        let actions = Actions::new();
        let label = |actions: &Actions| actions.entries.read()[0].handler.label().to_string();

        actions.register("sync", "", || async { Ok::<_, anyhow::Error>(()) });
        let first = label(&actions);
        actions.register("sync", "", || async { Ok::<_, anyhow::Error>(()) });
        let second = label(&actions);

        assert_ne!(first, second);
        assert!(second.contains("registry.rs"));
    }

    #[test]
    fn explicit_and_default_labels() {
        struct Flush;

        #[async_trait]
        impl ActionHandler for Flush {
            async fn invoke(&self) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let named = ActionFn::new(|| async { Ok::<_, anyhow::Error>(()) }).with_label("flush-v2");
        assert_eq!(named.label(), "flush-v2");
        assert!(Flush.label().ends_with("Flush"));
    }
}
