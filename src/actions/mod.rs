//! Named on-demand actions.
//!
//! ## Contents
//! - [`Actions`] registry with `register` / `invoke` / `actions`
//! - [`ActionHandler`], [`ActionFn`] action bodies
//! - [`ActionInfo`] serializable description

mod registry;

pub use registry::{ActionFn, ActionHandler, ActionInfo, Actions};
