//! Diagnostics and errors.
//!
//! Usage errors never abort rendering. They are reported through a
//! [`DiagnosticSink`]: logged with `tracing` and, when enabled, recorded so the
//! caller can inspect them afterwards.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use thiserror::Error;

use crate::types::NodeId;

// =============================================================================
// Diagnostics
// =============================================================================

/// A non-fatal usage error reported while mounting or rendering a component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// A render-context read found the name in neither state, props nor setup bindings.
    #[error("component `{component}` read undeclared name `{name}`")]
    UndeclaredRead { component: String, name: String },

    /// A render-context write found the name in neither state nor setup bindings.
    #[error("component `{component}` wrote undeclared name `{name}`")]
    UndeclaredWrite { component: String, name: String },

    /// A render-context write targeted a prop.
    #[error("component `{component}` attempted to mutate prop `{key}`; props are readonly")]
    PropMutation { component: String, key: String },

    /// `emit` found no handler under the transformed event name.
    #[error("component `{component}` emitted `{event}` but no `{handler}` handler was passed")]
    MissingHandler {
        component: String,
        event: String,
        handler: String,
    },

    /// `setup` returned a render function while the descriptor also declared one.
    #[error("component `{component}`: setup returned a render function, the `render` option is ignored")]
    RenderShadowed { component: String },

    /// Neither the descriptor nor `setup` supplied a render function.
    #[error("component `{component}` has no render function")]
    MissingRender { component: String },
}

impl Diagnostic {
    /// Name of the component the diagnostic is about.
    pub fn component(&self) -> &str {
        match self {
            Diagnostic::UndeclaredRead { component, .. }
            | Diagnostic::UndeclaredWrite { component, .. }
            | Diagnostic::PropMutation { component, .. }
            | Diagnostic::MissingHandler { component, .. }
            | Diagnostic::RenderShadowed { component }
            | Diagnostic::MissingRender { component } => component,
        }
    }
}

/// Shared diagnostic channel.
///
/// Cheap to clone; all clones feed the same log.
#[derive(Clone, Default)]
pub struct DiagnosticSink {
    recorded: Rc<RefCell<Vec<Diagnostic>>>,
    record: Rc<Cell<bool>>,
}

impl DiagnosticSink {
    /// Create a sink. When `record` is false diagnostics are only logged.
    pub fn new(record: bool) -> Self {
        Self {
            recorded: Rc::new(RefCell::new(Vec::new())),
            record: Rc::new(Cell::new(record)),
        }
    }

    /// Report a usage error.
    pub fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(component = diagnostic.component(), "{}", diagnostic);
        if self.record.get() {
            self.recorded.borrow_mut().push(diagnostic);
        }
    }

    /// Recorded diagnostics, oldest first.
    pub fn recorded(&self) -> Vec<Diagnostic> {
        self.recorded.borrow().clone()
    }

    /// Drain the recorded diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.recorded.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.borrow().is_empty()
    }
}

// =============================================================================
// Host Errors
// =============================================================================

/// Errors raised by the in-memory host when inspecting or dispatching to nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
}
