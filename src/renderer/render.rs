//! Render entry point.
//!
//! A [`Renderer`] owns the engine, the job scheduler and the diagnostic sink,
//! and remembers the last tree rendered into each container.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use spark_vdom::{MemoryHost, Renderer, h};
//!
//! let host = Rc::new(MemoryHost::new());
//! let root = host.create_root("app");
//! let renderer = Renderer::new(host.clone());
//!
//! renderer.render(Some(h("p").text("hello").build()), root);
//! assert_eq!(host.serialize(root), "<app><p>hello</p></app>");
//!
//! renderer.render(None, root);
//! assert_eq!(host.serialize(root), "<app></app>");
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::adapter::PlatformAdapter;
use super::patch::Engine;
use crate::config::RendererOptions;
use crate::error::{Diagnostic, DiagnosticSink};
use crate::reactive::untracked;
use crate::scheduler::Scheduler;
use crate::types::NodeId;
use crate::vnode::VNodeRef;

/// Renders virtual trees into containers of a platform adapter.
pub struct Renderer {
    engine: Rc<Engine>,
    options: Rc<RendererOptions>,
    diagnostics: DiagnosticSink,
    roots: RefCell<HashMap<NodeId, VNodeRef>>,
}

impl Renderer {
    pub fn new(adapter: Rc<dyn PlatformAdapter>) -> Self {
        Self::with_options(adapter, RendererOptions::default())
    }

    pub fn with_options(adapter: Rc<dyn PlatformAdapter>, options: RendererOptions) -> Self {
        let options = Rc::new(options);
        let diagnostics = DiagnosticSink::new(options.record_diagnostics);
        let scheduler = Rc::new(Scheduler::new(options.max_flush_rounds));
        let engine = Rc::new(Engine::new(adapter, scheduler, options.clone(), diagnostics.clone()));
        Self {
            engine,
            options,
            diagnostics,
            roots: RefCell::new(HashMap::new()),
        }
    }

    /// Reconcile `container` to `vnode`.
    ///
    /// `Some` patches against the container's previous tree, or mounts fresh if
    /// there is none. `None` unmounts the previous tree. Either way `vnode`
    /// becomes the container's previous tree. Rendering the same `VNodeRef`
    /// twice is a no-op.
    pub fn render(&self, vnode: Option<VNodeRef>, container: NodeId) {
        let prev = self.roots.borrow().get(&container).cloned();

        untracked(|| match (&prev, &vnode) {
            (prev, Some(next)) => self.engine.patch(prev.as_ref(), next, container, None),
            (Some(prev), None) => self.engine.unmount(prev),
            (None, None) => {}
        });

        let mut roots = self.roots.borrow_mut();
        match vnode {
            Some(vnode) => {
                roots.insert(container, vnode);
            }
            None => {
                roots.remove(&container);
            }
        }
    }

    /// Run every pending component update. Returns the number of jobs run.
    ///
    /// This is the renderer's tick: state changes only reach the live tree
    /// once the host calls it.
    pub fn flush(&self) -> usize {
        self.engine.scheduler().flush()
    }

    /// Whether updates are queued and waiting for [`flush`](Self::flush).
    pub fn is_pending(&self) -> bool {
        self.engine.scheduler().is_pending()
    }

    /// Tree last rendered into `container`.
    pub fn root(&self, container: NodeId) -> Option<VNodeRef> {
        self.roots.borrow().get(&container).cloned()
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// Usage errors recorded so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.recorded()
    }

    /// Drain the recorded usage errors.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }
}
