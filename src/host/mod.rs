//! Reference platform adapter.
//!
//! [`MemoryHost`] keeps a presentation tree in memory and implements the full
//! prop policy: listeners with bound-at guarded invokers, `class`, schema-driven
//! properties and plain attributes. Tests and demos render into it.

mod memory;
mod schema;

pub use memory::{HostOp, MemoryHost};
pub use schema::{PropFlags, prop_flags, should_set_as_property};
