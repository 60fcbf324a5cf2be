//! Render and setup contexts.
//!
//! [`RenderContext`] is the name-resolution surface a render function and the
//! lifecycle hooks see. Reads resolve `state → props → setup bindings` and return
//! the first hit; writes follow the same order but refuse to touch props.
//!
//! [`SetupContext`] only exists while `setup` runs. It is the one place mounted
//! hooks can be registered, which keeps "registration only during setup" a
//! property of the types rather than of ambient state.

use std::rc::{Rc, Weak};

use super::descriptor::Hook;
use super::instance::{ComponentInstance, InstanceId};
use crate::config::RendererOptions;
use crate::error::{Diagnostic, DiagnosticSink};
use crate::reactive::untracked;
use crate::types::{Record, Value};
use crate::vnode::{Slots, VNodeRef};

// =============================================================================
// Emitter
// =============================================================================

/// Emits component events to the handlers passed in by the parent.
///
/// Holds the instance weakly so handlers stored in the component's own subtree
/// do not keep it alive.
#[derive(Clone)]
pub struct Emitter {
    instance: Weak<ComponentInstance>,
    options: Rc<RendererOptions>,
    diagnostics: DiagnosticSink,
}

impl Emitter {
    pub(crate) fn new(
        instance: &Rc<ComponentInstance>,
        options: Rc<RendererOptions>,
        diagnostics: DiagnosticSink,
    ) -> Self {
        Self {
            instance: Rc::downgrade(instance),
            options,
            diagnostics,
        }
    }

    /// Invoke the `on{Event}` handler from the current props with `payload`.
    ///
    /// A missing handler is reported, not fatal. Returns whether a handler ran.
    pub fn emit(&self, event: &str, payload: &[Value]) -> bool {
        let Some(instance) = self.instance.upgrade() else {
            return false;
        };
        let key = self.options.handler_key(event);
        let handlers = untracked(|| instance.props().get(&key))
            .map(|value| value.handlers())
            .unwrap_or_default();

        if handlers.is_empty() {
            self.diagnostics.report(Diagnostic::MissingHandler {
                component: instance.name().to_string(),
                event: event.to_string(),
                handler: key,
            });
            return false;
        }
        for handler in handlers {
            handler.call(payload);
        }
        true
    }
}

// =============================================================================
// Render Context
// =============================================================================

/// Name-resolution surface for render functions and hooks.
pub struct RenderContext {
    instance: Rc<ComponentInstance>,
    emitter: Emitter,
    diagnostics: DiagnosticSink,
}

impl RenderContext {
    pub(crate) fn new(instance: Rc<ComponentInstance>, emitter: Emitter, diagnostics: DiagnosticSink) -> Self {
        Self {
            instance,
            emitter,
            diagnostics,
        }
    }

    pub fn instance(&self) -> &Rc<ComponentInstance> {
        &self.instance
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance.id()
    }

    /// Resolve `name` through state, props, then setup bindings.
    ///
    /// Reads are tracked, so a render function re-runs when what it read
    /// changes. An unknown name is reported and reads as `Value::Null`.
    pub fn read(&self, name: &str) -> Value {
        if let Some(value) = self.instance.state().and_then(|state| state.get(name)) {
            return value;
        }
        if let Some(value) = self.instance.props().get(name) {
            return value;
        }
        if let Some(value) = self.instance.setup_bindings().and_then(|b| b.get(name)) {
            return value;
        }
        self.diagnostics.report(Diagnostic::UndeclaredRead {
            component: self.instance.name().to_string(),
            name: name.to_string(),
        });
        Value::Null
    }

    /// `read` rendered as text.
    pub fn read_text(&self, name: &str) -> String {
        self.read(name).to_text()
    }

    /// `read` as an integer, 0 when absent or not an integer.
    pub fn read_int(&self, name: &str) -> i64 {
        self.read(name).as_int().unwrap_or(0)
    }

    /// Write `name` into state or setup bindings.
    ///
    /// Props are readonly from inside the component: a write that resolves to a
    /// prop is reported and dropped, as is a write to an unknown name. Returns
    /// whether a value was written.
    pub fn write(&self, name: &str, value: impl Into<Value>) -> bool {
        let instance = &self.instance;
        if let Some(state) = instance.state() {
            if untracked(|| state.contains_key(name)) {
                state.set(name, value);
                return true;
            }
        }
        if untracked(|| instance.props().contains_key(name)) {
            self.diagnostics.report(Diagnostic::PropMutation {
                component: instance.name().to_string(),
                key: name.to_string(),
            });
            return false;
        }
        if let Some(bindings) = instance.setup_bindings() {
            if untracked(|| bindings.contains_key(name)) {
                bindings.set(name, value);
                return true;
            }
        }
        self.diagnostics.report(Diagnostic::UndeclaredWrite {
            component: instance.name().to_string(),
            name: name.to_string(),
        });
        false
    }

    /// Slots passed by the parent. Always the instance's slots, whatever state,
    /// props or bindings hold.
    pub fn slots(&self) -> &Slots {
        self.instance.slots()
    }

    /// Render the named slot, if the parent supplied it.
    pub fn render_slot(&self, name: &str) -> Option<VNodeRef> {
        self.instance.slots().get(name).map(|render| render())
    }

    /// Caller-supplied keys that are not declared props.
    pub fn attrs(&self) -> &Record {
        self.instance.attrs()
    }

    pub fn emit(&self, event: &str, payload: &[Value]) -> bool {
        self.emitter.emit(event, payload)
    }

    /// Cloneable emit handle for use inside event handlers.
    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }
}

// =============================================================================
// Setup Context
// =============================================================================

/// Context handed to `setup` as its second argument.
pub struct SetupContext<'a> {
    instance: &'a ComponentInstance,
    emitter: Emitter,
}

impl<'a> SetupContext<'a> {
    pub(crate) fn new(instance: &'a ComponentInstance, emitter: Emitter) -> Self {
        Self { instance, emitter }
    }

    pub fn attrs(&self) -> &Record {
        self.instance.attrs()
    }

    pub fn slots(&self) -> &Slots {
        self.instance.slots()
    }

    pub fn emit(&self, event: &str, payload: &[Value]) -> bool {
        self.emitter.emit(event, payload)
    }

    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }

    /// Register a hook to run once, after the component's first mount.
    ///
    /// Hooks run in registration order, after the descriptor's own `mounted`.
    pub fn on_mounted(&self, hook: impl Fn(&RenderContext) + 'static) {
        self.instance.push_mounted_hook(Rc::new(hook) as Hook);
    }
}
