//! # spark-vdom
//!
//! A minimal UI component runtime: virtual trees, a reconciliation engine,
//! stateful components and a batching job scheduler.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! reactivity. Component state and props are reactive records; each mounted
//! component runs its render function as a tracked computation whose reruns
//! are queued on the renderer's scheduler and applied on [`Renderer::flush`].
//!
//! ## Architecture
//!
//! ```text
//! VNode tree → Renderer::render → patch/mount/unmount → PlatformAdapter
//!                                      ↑
//!        state/props write → render computation → Scheduler → flush
//! ```
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use spark_vdom::{Component, MemoryHost, Renderer, component, h, record};
//!
//! let counter = Rc::new(
//!     Component::named("Counter")
//!         .with_data(|| record! { "count" => 0 })
//!         .with_render(|ctx| h("span").text(ctx.read_text("count")).build()),
//! );
//!
//! let host = Rc::new(MemoryHost::new());
//! let root = host.create_root("app");
//! let renderer = Renderer::new(host.clone());
//!
//! let tree = component(&counter).build();
//! renderer.render(Some(tree.clone()), root);
//! assert_eq!(host.serialize(root), "<app><span>0</span></app>");
//!
//! let instance = tree.component().unwrap();
//! instance.state().unwrap().set("count", 5);
//! assert_eq!(host.text_content(root), "0", "updates wait for the flush");
//!
//! renderer.flush();
//! assert_eq!(host.serialize(root), "<app><span>5</span></app>");
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Values, records, node handles
//! - [`reactive`] - Reactive records and tracked computations over spark-signals
//! - [`scheduler`] - Job queue that batches component re-renders
//! - [`vnode`] - Virtual nodes and builders
//! - [`component`] - Descriptors, instances, render and setup contexts
//! - [`renderer`] - Platform adapter trait, reconciliation engine, entry point
//! - [`host`] - In-memory reference platform adapter

pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod reactive;
pub mod renderer;
pub mod scheduler;
pub mod types;
pub mod vnode;

// Re-export commonly used items
pub use types::*;

pub use component::{
    Component, ComponentInstance, Emitter, InstanceId, RenderContext, SetupContext, SetupResult,
};

pub use config::RendererOptions;

pub use error::{Diagnostic, DiagnosticSink, HostError};

pub use host::{HostOp, MemoryHost, PropFlags};

pub use reactive::{Reactive, ReadonlyRecord, reactive, shallow_reactive, shallow_readonly, untracked};

pub use renderer::{PlatformAdapter, Renderer};

pub use scheduler::{Job, Scheduler};

pub use vnode::{Children, VNode, VNodeBuilder, VNodeKind, VNodeRef, component, fragment, h};
