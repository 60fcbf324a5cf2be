//! Renderer - platform adapter trait, reconciliation engine and entry point.
//!
//! The engine is parameterized over a [`PlatformAdapter`]; it never touches a
//! presentation tree itself. [`Renderer`] is the public surface: `render` a
//! tree into a container, then `flush` to apply state-driven updates.

mod adapter;
mod patch;
mod render;

pub use adapter::PlatformAdapter;
pub use render::Renderer;
