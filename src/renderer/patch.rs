//! Reconciliation engine - mount, patch and unmount of virtual trees.
//!
//! # Policy
//!
//! - A type change between old and new is never diffed: the old node is
//!   unmounted and the new one mounted fresh.
//! - Element patches reuse the live node and diff props key by key.
//! - Child lists are unkeyed: every old child is unmounted and every new child
//!   mounted fresh, whatever their order or content.
//! - Component patches reuse the instance and write changed props into its
//!   existing props record; the instance's render computation does the rest.

use std::rc::{Rc, Weak};

use super::adapter::PlatformAdapter;
use crate::component::{
    Component, ComponentInstance, Emitter, PreparedInstance, RenderContext, RenderFn, create_instance,
    has_props_changed, resolve_props,
};
use crate::config::RendererOptions;
use crate::error::{Diagnostic, DiagnosticSink};
use crate::reactive::{SchedulerHook, run_tracked, untracked};
use crate::scheduler::Scheduler;
use crate::types::NodeId;
use crate::vnode::{Children, VNode, VNodeKind, VNodeRef};

/// Shared reconciliation state: the adapter plus what component computations need.
pub(crate) struct Engine {
    adapter: Rc<dyn PlatformAdapter>,
    scheduler: Rc<Scheduler>,
    options: Rc<RendererOptions>,
    diagnostics: DiagnosticSink,
}

impl Engine {
    pub(crate) fn new(
        adapter: Rc<dyn PlatformAdapter>,
        scheduler: Rc<Scheduler>,
        options: Rc<RendererOptions>,
        diagnostics: DiagnosticSink,
    ) -> Self {
        Self {
            adapter,
            scheduler,
            options,
            diagnostics,
        }
    }

    pub(crate) fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    // =========================================================================
    // Patch
    // =========================================================================

    /// Converge the live tree under `container` from `old` to `new`.
    ///
    /// `old == None` mounts `new` before `anchor`.
    pub(crate) fn patch(
        self: &Rc<Self>,
        old: Option<&VNodeRef>,
        new: &VNodeRef,
        container: NodeId,
        anchor: Option<NodeId>,
    ) {
        let mut old = old;
        if let Some(prev) = old {
            if Rc::ptr_eq(prev, new) {
                return;
            }
            if !prev.same_type(new) {
                tracing::trace!(old = ?prev.kind(), new = ?new.kind(), "type changed, remounting");
                self.unmount(prev);
                old = None;
            }
        }

        match new.kind() {
            VNodeKind::Element(tag) => match old {
                None => self.mount_element(tag, new, container, anchor),
                Some(old) => self.patch_element(old, new, container, anchor),
            },
            VNodeKind::Component(descriptor) => match old {
                None => self.mount_component(descriptor, new, container, anchor),
                Some(old) => self.patch_component(old, new),
            },
            VNodeKind::Fragment(members) => {
                if let Some(old) = old {
                    self.unmount(old);
                }
                for member in members {
                    self.patch(None, member, container, anchor);
                }
            }
        }
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn mount_element(self: &Rc<Self>, tag: &str, vnode: &VNode, container: NodeId, anchor: Option<NodeId>) {
        let el = self.adapter.create_element(tag);
        vnode.set_el(Some(el));

        match vnode.children() {
            Children::Text(text) => self.adapter.set_element_text(el, text),
            Children::Nodes(nodes) => {
                for child in nodes {
                    self.patch(None, child, el, None);
                }
            }
            Children::None | Children::Slots(_) => {}
        }

        for (key, value) in vnode.props() {
            self.adapter.patch_prop(el, key, None, Some(value));
        }

        self.adapter.insert(el, container, anchor);
    }

    fn patch_element(self: &Rc<Self>, old: &VNode, new: &VNode, container: NodeId, anchor: Option<NodeId>) {
        let Some(el) = old.el() else {
            // Old node never made it into the tree; nothing to reuse.
            if let VNodeKind::Element(tag) = new.kind() {
                self.mount_element(tag, new, container, anchor);
            }
            return;
        };
        new.set_el(Some(el));

        let (old_props, new_props) = (old.props(), new.props());
        for (key, next) in new_props {
            let prev = old_props.get(key);
            if prev != Some(next) {
                self.adapter.patch_prop(el, key, prev, Some(next));
            }
        }
        for (key, prev) in old_props {
            if !new_props.contains_key(key) {
                self.adapter.patch_prop(el, key, Some(prev), None);
            }
        }

        self.patch_children(old, new, el);
    }

    /// Unkeyed children reconciliation.
    fn patch_children(self: &Rc<Self>, old: &VNode, new: &VNode, el: NodeId) {
        match new.children() {
            Children::Text(text) => {
                for child in old.child_nodes() {
                    self.unmount(child);
                }
                self.adapter.set_element_text(el, text);
            }
            Children::Nodes(nodes) => {
                if let Children::Nodes(old_nodes) = old.children() {
                    for child in old_nodes {
                        self.unmount(child);
                    }
                } else {
                    self.adapter.set_element_text(el, "");
                }
                for child in nodes {
                    self.patch(None, child, el, None);
                }
            }
            Children::None | Children::Slots(_) => match old.children() {
                Children::Nodes(old_nodes) => {
                    for child in old_nodes {
                        self.unmount(child);
                    }
                }
                Children::Text(_) => self.adapter.set_element_text(el, ""),
                Children::None | Children::Slots(_) => {}
            },
        }
    }

    // =========================================================================
    // Components
    // =========================================================================

    fn mount_component(
        self: &Rc<Self>,
        descriptor: &Rc<Component>,
        vnode: &VNode,
        container: NodeId,
        anchor: Option<NodeId>,
    ) {
        let PreparedInstance {
            instance,
            emitter,
            render,
        } = create_instance(vnode, descriptor, &self.options, &self.diagnostics);

        let context = RenderContext::new(instance.clone(), emitter.clone(), self.diagnostics.clone());
        if let Some(created) = &descriptor.created {
            untracked(|| created(&context));
        }

        let Some(render) = render else {
            self.diagnostics.report(Diagnostic::MissingRender {
                component: descriptor.name.clone(),
            });
            return;
        };

        let hook: SchedulerHook = {
            let scheduler = Rc::downgrade(&self.scheduler);
            Rc::new(move |job| {
                if let Some(scheduler) = scheduler.upgrade() {
                    scheduler.queue_job(job);
                }
            })
        };

        let body = render_effect(
            Rc::downgrade(self),
            Rc::downgrade(&instance),
            render,
            emitter,
            container,
            anchor,
        );
        instance.attach_effect(run_tracked(body, Some(hook)));
    }

    fn patch_component(self: &Rc<Self>, old: &VNode, new: &VNode) {
        let Some(instance) = old.component() else {
            return;
        };
        new.set_component(Some(instance.clone()));

        if !has_props_changed(old.props(), new.props()) {
            return;
        }

        let (next_props, _) = resolve_props(instance.descriptor(), new.props(), &self.options);
        let props = instance.props();
        for (key, value) in &next_props {
            props.set(key, value.clone());
        }
        let stale: Vec<String> = untracked(|| props.keys())
            .into_iter()
            .filter(|key| !next_props.contains_key(key))
            .collect();
        for key in stale {
            props.remove(&key);
        }
    }

    // =========================================================================
    // Unmount
    // =========================================================================

    /// Remove `vnode`'s live nodes and stop every component computation in it.
    pub(crate) fn unmount(&self, vnode: &VNode) {
        match vnode.kind() {
            VNodeKind::Element(_) => {
                if let Some(el) = vnode.el() {
                    self.adapter.remove(el);
                }
                for child in vnode.child_nodes() {
                    stop_components(child);
                }
            }
            VNodeKind::Component(_) => {
                if let Some(instance) = vnode.component() {
                    instance.stop();
                    if let Some(sub_tree) = instance.sub_tree() {
                        self.unmount(&sub_tree);
                    }
                }
            }
            VNodeKind::Fragment(members) => {
                for member in members {
                    self.unmount(member);
                }
            }
        }
    }
}

/// Stop component computations below a node whose live subtree is already detached.
fn stop_components(vnode: &VNode) {
    match vnode.kind() {
        VNodeKind::Element(_) => {
            for child in vnode.child_nodes() {
                stop_components(child);
            }
        }
        VNodeKind::Component(_) => {
            if let Some(instance) = vnode.component() {
                instance.stop();
                if let Some(sub_tree) = instance.sub_tree() {
                    stop_components(&sub_tree);
                }
            }
        }
        VNodeKind::Fragment(members) => {
            for member in members {
                stop_components(member);
            }
        }
    }
}

/// Body of a component's render computation.
///
/// Renders tracked, then mounts or patches the new subtree untracked so that
/// hook and child reads do not subscribe this component. Engine and instance
/// are held weakly: the instance owns this computation.
fn render_effect(
    engine: Weak<Engine>,
    instance: Weak<ComponentInstance>,
    render: RenderFn,
    emitter: Emitter,
    container: NodeId,
    anchor: Option<NodeId>,
) -> impl FnMut() + 'static {
    move || {
        let (Some(engine), Some(instance)) = (engine.upgrade(), instance.upgrade()) else {
            return;
        };
        let context = RenderContext::new(instance.clone(), emitter.clone(), engine.diagnostics.clone());
        let sub_tree = render(&context);
        let descriptor = instance.descriptor().clone();

        untracked(|| {
            if !instance.is_mounted() {
                if let Some(before_mount) = &descriptor.before_mount {
                    before_mount(&context);
                }
                engine.patch(None, &sub_tree, container, anchor);
                instance.mark_mounted();
                tracing::debug!(component = %descriptor.name, id = instance.id().0, "component mounted");
                if let Some(mounted) = &descriptor.mounted {
                    mounted(&context);
                }
                for hook in instance.mounted_hooks() {
                    hook(&context);
                }
            } else {
                if let Some(before_update) = &descriptor.before_update {
                    before_update(&context);
                }
                let prev = instance.sub_tree();
                engine.patch(prev.as_ref(), &sub_tree, container, anchor);
                tracing::trace!(component = %descriptor.name, id = instance.id().0, "component updated");
                if let Some(updated) = &descriptor.updated {
                    updated(&context);
                }
            }
            instance.set_sub_tree(sub_tree);
        });
    }
}
