//! Component instances - the live, stateful half of a component.
//!
//! One instance is created per mounted component VNode and carried forward to
//! the VNode that replaces it on every re-render. Its `props` record keeps the
//! same identity for the instance's whole life: re-renders write into it, they
//! never swap it out, because the render computation is subscribed to it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::context::{Emitter, SetupContext};
use super::descriptor::{Component, Hook, RenderFn, SetupResult};
use super::props::resolve_props;
use crate::config::RendererOptions;
use crate::error::{Diagnostic, DiagnosticSink};
use crate::reactive::{EffectHandle, Reactive, reactive, shallow_reactive, shallow_readonly};
use crate::types::Record;
use crate::vnode::{Children, Slots, VNode, VNodeRef};

// =============================================================================
// Instance Ids
// =============================================================================

thread_local! {
    /// Counter for generating unique instance ids.
    static NEXT_INSTANCE_ID: Cell<u64> = const { Cell::new(0) };
}

/// Process-unique id of a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

fn next_instance_id() -> InstanceId {
    NEXT_INSTANCE_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        InstanceId(id)
    })
}

// =============================================================================
// Component Instance
// =============================================================================

/// Live per-component state.
pub struct ComponentInstance {
    id: InstanceId,
    descriptor: Rc<Component>,
    state: Option<Reactive>,
    props: Reactive,
    attrs: Record,
    slots: Slots,
    is_mounted: Cell<bool>,
    sub_tree: RefCell<Option<VNodeRef>>,
    mounted_hooks: RefCell<Vec<Hook>>,
    setup_bindings: RefCell<Option<Reactive>>,
    effect: RefCell<Option<EffectHandle>>,
}

impl ComponentInstance {
    fn new(descriptor: Rc<Component>, state: Option<Reactive>, props: Record, attrs: Record, slots: Slots) -> Self {
        Self {
            id: next_instance_id(),
            descriptor,
            state,
            props: shallow_reactive(props),
            attrs,
            slots,
            is_mounted: Cell::new(false),
            sub_tree: RefCell::new(None),
            mounted_hooks: RefCell::new(Vec::new()),
            setup_bindings: RefCell::new(None),
            effect: RefCell::new(None),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &Rc<Component> {
        &self.descriptor
    }

    /// Local state from `data()`, if the descriptor has one.
    pub fn state(&self) -> Option<&Reactive> {
        self.state.as_ref()
    }

    /// Resolved props. Same record for the instance's whole life.
    pub fn props(&self) -> &Reactive {
        &self.props
    }

    pub fn attrs(&self) -> &Record {
        &self.attrs
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn is_mounted(&self) -> bool {
        self.is_mounted.get()
    }

    pub(crate) fn mark_mounted(&self) {
        self.is_mounted.set(true);
    }

    /// Subtree produced by the last render.
    pub fn sub_tree(&self) -> Option<VNodeRef> {
        self.sub_tree.borrow().clone()
    }

    pub(crate) fn set_sub_tree(&self, tree: VNodeRef) {
        *self.sub_tree.borrow_mut() = Some(tree);
    }

    pub fn setup_bindings(&self) -> Option<Reactive> {
        self.setup_bindings.borrow().clone()
    }

    pub fn mounted_hook_count(&self) -> usize {
        self.mounted_hooks.borrow().len()
    }

    pub(crate) fn push_mounted_hook(&self, hook: Hook) {
        self.mounted_hooks.borrow_mut().push(hook);
    }

    pub(crate) fn mounted_hooks(&self) -> Vec<Hook> {
        self.mounted_hooks.borrow().clone()
    }

    pub(crate) fn attach_effect(&self, effect: EffectHandle) {
        *self.effect.borrow_mut() = Some(effect);
    }

    /// Whether the render computation is attached and running.
    pub fn is_active(&self) -> bool {
        self.effect
            .borrow()
            .as_ref()
            .is_some_and(|effect| !effect.is_stopped())
    }

    /// Stop the render computation. The instance stops reacting to changes.
    pub(crate) fn stop(&self) {
        if let Some(effect) = self.effect.borrow_mut().take() {
            effect.stop();
        }
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("name", &self.descriptor.name)
            .field("props", &self.props)
            .field("is_mounted", &self.is_mounted.get())
            .finish()
    }
}

// =============================================================================
// Creation
// =============================================================================

/// An instance that finished `setup` and is ready for its render computation.
pub(crate) struct PreparedInstance {
    pub instance: Rc<ComponentInstance>,
    pub emitter: Emitter,
    pub render: Option<RenderFn>,
}

/// Create the instance for a component VNode and run its initialization.
///
/// Runs `beforeCreate`, builds state and resolved props, runs `setup` with an
/// explicit context, and attaches the instance to `vnode`. The returned render
/// function is the one `setup` returned, else the descriptor's.
pub(crate) fn create_instance(
    vnode: &VNode,
    descriptor: &Rc<Component>,
    options: &Rc<RendererOptions>,
    diagnostics: &DiagnosticSink,
) -> PreparedInstance {
    if let Some(before_create) = &descriptor.before_create {
        before_create();
    }

    let state = descriptor.data.as_ref().map(|data| reactive(data()));
    let (props, attrs) = resolve_props(descriptor, vnode.props(), options);
    let slots = match vnode.children() {
        Children::Slots(slots) => slots.clone(),
        _ => Slots::default(),
    };

    let instance = Rc::new(ComponentInstance::new(descriptor.clone(), state, props, attrs, slots));
    let emitter = Emitter::new(&instance, options.clone(), diagnostics.clone());

    let mut render = descriptor.render.clone();
    if let Some(setup) = &descriptor.setup {
        let readonly_props = shallow_readonly(instance.props());
        let context = SetupContext::new(&instance, emitter.clone());
        match setup(&readonly_props, &context) {
            SetupResult::Render(setup_render) => {
                if descriptor.render.is_some() {
                    diagnostics.report(Diagnostic::RenderShadowed {
                        component: descriptor.name.clone(),
                    });
                }
                render = Some(setup_render);
            }
            SetupResult::Bindings(bindings) => {
                *instance.setup_bindings.borrow_mut() = Some(reactive(bindings));
            }
            SetupResult::Empty => {}
        }
    }

    vnode.set_component(Some(instance.clone()));
    tracing::debug!(component = %descriptor.name, id = instance.id.0, "component instance created");

    PreparedInstance {
        instance,
        emitter,
        render,
    }
}
