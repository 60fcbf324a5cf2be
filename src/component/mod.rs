//! Component model.
//!
//! A [`Component`] is the static descriptor authors write: declared props, a
//! state factory, `setup`, `render` and lifecycle hooks. Mounting a component
//! VNode creates a [`ComponentInstance`] holding the live state, resolved
//! props, attrs and slots, plus the render computation that keeps its subtree
//! in sync.

mod context;
mod descriptor;
mod instance;
mod props;

pub use context::{Emitter, RenderContext, SetupContext};
pub use descriptor::{BeforeCreateFn, Component, DataFn, Hook, RenderFn, SetupFn, SetupResult};
pub use instance::{ComponentInstance, InstanceId};
pub use props::{has_props_changed, resolve_props};

pub(crate) use instance::{PreparedInstance, create_instance};
