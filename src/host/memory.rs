//! In-memory presentation tree implementing [`PlatformAdapter`].
//!
//! Nodes live in an index-addressed arena and are referred to by [`NodeId`].
//! Every adapter call is appended to an operation log so tests can assert on
//! exactly what the engine asked for.
//!
//! # Events
//!
//! Prop keys carrying the event prefix bind listeners through a per-node,
//! per-event *invoker*. Rebinding swaps the invoker's handler and stamps it
//! with the current logical time; unbinding removes it. [`MemoryHost::dispatch`]
//! bubbles an event from the target to the root and skips invokers bound after
//! the event's timestamp, so a handler attached while an event is in flight
//! never sees that event.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;

use super::schema::{PropFlags, prop_flags};
use crate::error::HostError;
use crate::renderer::PlatformAdapter;
use crate::types::{Handler, NodeId, Value};

// =============================================================================
// Operation Log
// =============================================================================

/// One adapter call, as recorded by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateElement { node: NodeId, tag: String },
    CreateText { node: NodeId, text: String },
    SetElementText { el: NodeId, text: String },
    SetText { node: NodeId, text: String },
    Insert { child: NodeId, parent: NodeId, anchor: Option<NodeId> },
    Remove { child: NodeId },
    PatchProp { el: NodeId, key: String, prev: Option<Value>, next: Option<Value> },
}

impl HostOp {
    pub fn is_create(&self) -> bool {
        matches!(self, HostOp::CreateElement { .. } | HostOp::CreateText { .. })
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, HostOp::Remove { .. })
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// A bound listener. `bound_at` is the logical time of the last (re)bind.
struct Invoker {
    value: Value,
    bound_at: u64,
}

enum NodeData {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        properties: IndexMap<String, Value>,
        class_name: String,
        invokers: IndexMap<String, Invoker>,
    },
    Text(String),
}

struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn element(tag: &str) -> Self {
        Self {
            data: NodeData::Element {
                tag: tag.to_string(),
                attributes: IndexMap::new(),
                properties: IndexMap::new(),
                class_name: String::new(),
                invokers: IndexMap::new(),
            },
            parent: None,
            children: Vec::new(),
        }
    }

    fn text(text: &str) -> Self {
        Self {
            data: NodeData::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
        }
    }
}

// =============================================================================
// Memory Host
// =============================================================================

/// In-memory reference platform.
pub struct MemoryHost {
    nodes: RefCell<Vec<Node>>,
    ops: RefCell<Vec<HostOp>>,
    clock: Cell<u64>,
    event_prefix: String,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::with_event_prefix("on")
    }

    /// Host treating keys that start with `prefix` as listeners.
    pub fn with_event_prefix(prefix: impl Into<String>) -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            ops: RefCell::new(Vec::new()),
            clock: Cell::new(0),
            event_prefix: prefix.into(),
        }
    }

    /// Create a detached element to render into. Not recorded in the op log.
    pub fn create_root(&self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag))
    }

    fn alloc(&self, node: Node) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        NodeId(nodes.len() - 1)
    }

    fn record(&self, op: HostOp) {
        tracing::trace!(?op, "host op");
        self.ops.borrow_mut().push(op);
    }

    /// Advance the logical clock and return the new time.
    fn tick(&self) -> u64 {
        let now = self.clock.get() + 1;
        self.clock.set(now);
        now
    }

    /// Current logical time. Events dispatched with [`dispatch`](Self::dispatch)
    /// carry this timestamp.
    pub fn now(&self) -> u64 {
        self.clock.get()
    }

    // =========================================================================
    // Operation Log
    // =========================================================================

    pub fn ops(&self) -> Vec<HostOp> {
        self.ops.borrow().clone()
    }

    pub fn take_ops(&self) -> Vec<HostOp> {
        std::mem::take(&mut *self.ops.borrow_mut())
    }

    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    fn check(&self, node: NodeId) -> Result<(), HostError> {
        if node.0 < self.nodes.borrow().len() {
            Ok(())
        } else {
            Err(HostError::UnknownNode(node))
        }
    }

    /// Tag of an element, `None` for text nodes and unknown ids.
    pub fn tag(&self, node: NodeId) -> Option<String> {
        match &self.nodes.borrow().get(node.0)?.data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text(_) => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.0)?.parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        collect_text(&nodes, node, &mut out);
        out
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes.borrow().get(node.0)?.data {
            NodeData::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeData::Text(_) => None,
        }
    }

    pub fn property(&self, node: NodeId, name: &str) -> Option<Value> {
        match &self.nodes.borrow().get(node.0)?.data {
            NodeData::Element { properties, .. } => properties.get(name).cloned(),
            NodeData::Text(_) => None,
        }
    }

    pub fn class_name(&self, node: NodeId) -> String {
        match self.nodes.borrow().get(node.0).map(|n| &n.data) {
            Some(NodeData::Element { class_name, .. }) => class_name.clone(),
            _ => String::new(),
        }
    }

    /// Whether an invoker is bound for `event` (lower-case name, no prefix).
    pub fn has_listener(&self, node: NodeId, event: &str) -> bool {
        match self.nodes.borrow().get(node.0).map(|n| &n.data) {
            Some(NodeData::Element { invokers, .. }) => invokers.contains_key(event),
            _ => false,
        }
    }

    /// Markup rendering of `node`: class first, then attributes in set order.
    /// Properties and listeners are not serialized.
    pub fn serialize(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        serialize_into(&nodes, node, &mut out);
        out
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Dispatch `event` at `target` with the current time. See [`dispatch_at`](Self::dispatch_at).
    pub fn dispatch(&self, target: NodeId, event: &str, payload: &[Value]) -> Result<usize, HostError> {
        self.dispatch_at(target, event, self.now(), payload)
    }

    /// Dispatch `event` stamped `timestamp`, bubbling from `target` to the root.
    ///
    /// The path is the target's ancestors at dispatch time, even if a handler
    /// moves or removes nodes.
    /// Invokers bound after `timestamp` are skipped. Returns the number of
    /// handler calls made.
    pub fn dispatch_at(
        &self,
        target: NodeId,
        event: &str,
        timestamp: u64,
        payload: &[Value],
    ) -> Result<usize, HostError> {
        self.check(target)?;
        if self.tag(target).is_none() {
            return Err(HostError::NotAnElement(target));
        }

        // The propagation path is fixed before any handler runs.
        let mut path = vec![target];
        let mut current = target;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }

        let mut calls = 0;
        for node in path {
            // Handlers may patch this host, so no borrow is held across calls.
            for handler in self.handlers_for(node, event, timestamp) {
                handler.call(payload);
                calls += 1;
            }
        }
        tracing::trace!(%target, event, timestamp, calls, "event dispatched");
        Ok(calls)
    }

    fn handlers_for(&self, node: NodeId, event: &str, timestamp: u64) -> Vec<Handler> {
        match self.nodes.borrow().get(node.0).map(|n| &n.data) {
            Some(NodeData::Element { invokers, .. }) => match invokers.get(event) {
                Some(invoker) if timestamp >= invoker.bound_at => invoker.value.handlers(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    // =========================================================================
    // Prop Application
    // =========================================================================

    fn apply_prop(&self, el: NodeId, key: &str, next: Option<&Value>) -> Result<(), HostError> {
        let bound_at = if key.starts_with(&self.event_prefix) {
            Some(self.tick())
        } else {
            None
        };

        let mut nodes = self.nodes.borrow_mut();
        let node = nodes.get_mut(el.0).ok_or(HostError::UnknownNode(el))?;
        let NodeData::Element {
            tag,
            attributes,
            properties,
            class_name,
            invokers,
        } = &mut node.data
        else {
            return Err(HostError::NotAnElement(el));
        };

        if let Some(bound_at) = bound_at {
            let event = key[self.event_prefix.len()..].to_lowercase();
            match next.filter(|value| !value.handlers().is_empty()) {
                Some(value) => {
                    let invoker = invokers.entry(event).or_insert_with(|| Invoker {
                        value: Value::Null,
                        bound_at,
                    });
                    invoker.value = value.clone();
                    invoker.bound_at = bound_at;
                }
                None => {
                    invokers.shift_remove(&event);
                }
            }
            return Ok(());
        }

        if key == "class" {
            *class_name = next.map(Value::to_text).unwrap_or_default();
            return Ok(());
        }

        let flags = prop_flags(tag, key);
        if flags.contains(PropFlags::PROPERTY) && !flags.contains(PropFlags::READONLY) {
            let value = if flags.contains(PropFlags::BOOLEAN) {
                Value::Bool(coerce_bool(next))
            } else {
                next.cloned().unwrap_or_else(|| Value::from(""))
            };
            properties.insert(key.to_string(), value);
            return Ok(());
        }

        match next.filter(|value| !value.is_null()) {
            Some(value) => {
                attributes.insert(key.to_string(), value.to_text());
            }
            None => {
                attributes.shift_remove(key);
            }
        }
        Ok(())
    }

    fn detach(nodes: &mut [Node], child: NodeId) {
        let Some(parent) = nodes.get_mut(child.0).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = nodes.get_mut(parent.0) {
            parent.children.retain(|&c| c != child);
        }
    }
}

/// Boolean property coercion: `""` is true, a removed or null value is false.
fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Int(n)) => *n != 0,
        Some(_) => true,
    }
}

fn collect_text(nodes: &[Node], node: NodeId, out: &mut String) {
    let Some(n) = nodes.get(node.0) else {
        return;
    };
    if let NodeData::Text(text) = &n.data {
        out.push_str(text);
    }
    for &child in &n.children {
        collect_text(nodes, child, out);
    }
}

fn serialize_into(nodes: &[Node], node: NodeId, out: &mut String) {
    let Some(n) = nodes.get(node.0) else {
        return;
    };
    match &n.data {
        NodeData::Text(text) => out.push_str(text),
        NodeData::Element {
            tag,
            attributes,
            class_name,
            ..
        } => {
            out.push('<');
            out.push_str(tag);
            if !class_name.is_empty() {
                out.push_str(&format!(" class=\"{class_name}\""));
            }
            for (name, value) in attributes {
                out.push_str(&format!(" {name}=\"{value}\""));
            }
            out.push('>');
            for &child in &n.children {
                serialize_into(nodes, child, out);
            }
            out.push_str(&format!("</{tag}>"));
        }
    }
}

// =============================================================================
// Adapter
// =============================================================================

impl PlatformAdapter for MemoryHost {
    fn create_element(&self, tag: &str) -> NodeId {
        let node = self.alloc(Node::element(tag));
        self.record(HostOp::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn create_text(&self, text: &str) -> NodeId {
        let node = self.alloc(Node::text(text));
        self.record(HostOp::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn set_element_text(&self, el: NodeId, text: &str) {
        self.record(HostOp::SetElementText {
            el,
            text: text.to_string(),
        });
        if let Err(err) = self.check(el) {
            tracing::warn!(%err, "set_element_text");
            return;
        }

        let text_node = (!text.is_empty()).then(|| self.alloc(Node::text(text)));
        let mut nodes = self.nodes.borrow_mut();
        let old_children = std::mem::take(&mut nodes[el.0].children);
        for child in old_children {
            nodes[child.0].parent = None;
        }
        if let Some(text_node) = text_node {
            nodes[text_node.0].parent = Some(el);
            nodes[el.0].children.push(text_node);
        }
    }

    fn set_text(&self, node: NodeId, text: &str) {
        self.record(HostOp::SetText {
            node,
            text: text.to_string(),
        });
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get_mut(node.0).map(|n| &mut n.data) {
            Some(NodeData::Text(current)) => *current = text.to_string(),
            Some(NodeData::Element { .. }) => {
                tracing::warn!(err = %HostError::NotAnElement(node), "set_text on an element");
            }
            None => {
                tracing::warn!(err = %HostError::UnknownNode(node), "set_text");
            }
        }
    }

    fn insert(&self, child: NodeId, parent: NodeId, anchor: Option<NodeId>) {
        self.record(HostOp::Insert { child, parent, anchor });
        if let Err(err) = self.check(child).and_then(|_| self.check(parent)) {
            tracing::warn!(%err, "insert");
            return;
        }

        let mut nodes = self.nodes.borrow_mut();
        Self::detach(&mut nodes, child);
        let siblings = &mut nodes[parent.0].children;
        let index = anchor
            .and_then(|anchor| siblings.iter().position(|&c| c == anchor))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        nodes[child.0].parent = Some(parent);
    }

    fn remove(&self, child: NodeId) {
        self.record(HostOp::Remove { child });
        Self::detach(&mut self.nodes.borrow_mut(), child);
    }

    fn patch_prop(&self, el: NodeId, key: &str, prev: Option<&Value>, next: Option<&Value>) {
        self.record(HostOp::PatchProp {
            el,
            key: key.to_string(),
            prev: prev.cloned(),
            next: next.cloned(),
        });
        if let Err(err) = self.apply_prop(el, key, next) {
            tracing::warn!(%err, key, "patch_prop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_insert_append_and_before_anchor() {
        let host = MemoryHost::new();
        let root = host.create_root("root");
        let a = host.create_element("a");
        let b = host.create_element("b");
        let c = host.create_element("c");

        host.insert(a, root, None);
        host.insert(c, root, None);
        host.insert(b, root, Some(c));

        assert_eq!(host.children(root), vec![a, b, c]);
        assert_eq!(host.parent(b), Some(root));
        assert_eq!(host.serialize(root), "<root><a></a><b></b><c></c></root>");
    }

    #[test]
    fn test_remove_detaches_only_when_attached() {
        let host = MemoryHost::new();
        let root = host.create_root("root");
        let a = host.create_element("a");
        host.insert(a, root, None);

        host.remove(a);
        assert!(host.children(root).is_empty());
        assert_eq!(host.parent(a), None);

        // Detached nodes are a no-op
        host.remove(a);
        assert_eq!(host.ops().iter().filter(|op| op.is_remove()).count(), 2);
    }

    #[test]
    fn test_set_element_text_replaces_children() {
        let host = MemoryHost::new();
        let el = host.create_root("p");
        let child = host.create_element("span");
        host.insert(child, el, None);

        host.set_element_text(el, "hi");
        assert_eq!(host.text_content(el), "hi");
        assert_eq!(host.parent(child), None);

        host.set_element_text(el, "");
        assert!(host.children(el).is_empty());
        assert_eq!(host.serialize(el), "<p></p>");
    }

    #[test]
    fn test_text_nodes() {
        let host = MemoryHost::new();
        let root = host.create_root("root");
        let text = host.create_text("a");
        host.insert(text, root, None);
        host.set_text(text, "b");
        assert_eq!(host.text_content(root), "b");
        assert_eq!(host.tag(text), None);
    }

    #[test]
    fn test_class_attributes_and_properties() {
        let host = MemoryHost::new();
        let input = host.create_element("input");

        host.patch_prop(input, "class", None, Some(&Value::from("field")));
        host.patch_prop(input, "id", None, Some(&Value::from("name")));
        host.patch_prop(input, "value", None, Some(&Value::from("x")));
        host.patch_prop(input, "disabled", None, Some(&Value::from("")));
        host.patch_prop(input, "form", None, Some(&Value::from("signup")));

        assert_eq!(host.class_name(input), "field");
        assert_eq!(host.attribute(input, "id").as_deref(), Some("name"));
        assert_eq!(host.property(input, "value"), Some(Value::from("x")));
        assert_eq!(host.property(input, "disabled"), Some(Value::Bool(true)));
        assert_eq!(host.property(input, "form"), None);
        assert_eq!(host.attribute(input, "form").as_deref(), Some("signup"));

        host.patch_prop(input, "class", Some(&Value::from("field")), None);
        host.patch_prop(input, "id", Some(&Value::from("name")), None);
        host.patch_prop(input, "disabled", Some(&Value::from("")), None);

        assert_eq!(host.class_name(input), "");
        assert_eq!(host.attribute(input, "id"), None);
        assert_eq!(host.property(input, "disabled"), Some(Value::Bool(false)));
        assert_eq!(host.serialize(input), "<input form=\"signup\"></input>");
    }

    #[test]
    fn test_listener_bind_rebind_unbind() {
        let host = MemoryHost::new();
        let button = host.create_element("button");
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let log = log.clone();
            Handler::new(move |_| log.borrow_mut().push("first"))
        };
        let second = {
            let log = log.clone();
            Handler::new(move |_| log.borrow_mut().push("second"))
        };

        host.patch_prop(button, "onClick", None, Some(&Value::Handler(first.clone())));
        assert!(host.has_listener(button, "click"));
        assert_eq!(host.dispatch(button, "click", &[]), Ok(1));

        host.patch_prop(
            button,
            "onClick",
            Some(&Value::Handler(first.clone())),
            Some(&Value::Handler(second.clone())),
        );
        assert_eq!(host.dispatch(button, "click", &[]), Ok(1));

        host.patch_prop(button, "onClick", Some(&Value::Handler(second)), None);
        assert!(!host.has_listener(button, "click"));
        assert_eq!(host.dispatch(button, "click", &[]), Ok(0));

        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_handler_lists() {
        let host = MemoryHost::new();
        let el = host.create_element("div");
        let count = Rc::new(Cell::new(0));
        let handlers: Vec<Value> = (0..3)
            .map(|_| {
                let count = count.clone();
                Value::Handler(Handler::new(move |_| count.set(count.get() + 1)))
            })
            .collect();

        host.patch_prop(el, "onPing", None, Some(&Value::List(handlers)));
        assert_eq!(host.dispatch(el, "ping", &[]), Ok(3));
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_events_older_than_binding_are_ignored() {
        let host = MemoryHost::new();
        let el = host.create_element("div");
        let fired = Rc::new(Cell::new(false));

        let stamp = host.now();
        let handler = {
            let fired = fired.clone();
            Handler::new(move |_| fired.set(true))
        };
        host.patch_prop(el, "onClick", None, Some(&Value::Handler(handler)));

        assert_eq!(host.dispatch_at(el, "click", stamp, &[]), Ok(0));
        assert!(!fired.get());
        assert_eq!(host.dispatch(el, "click", &[]), Ok(1));
        assert!(fired.get());
    }

    #[test]
    fn test_events_bubble() {
        let host = MemoryHost::new();
        let outer = host.create_root("div");
        let inner = host.create_element("span");
        host.insert(inner, outer, None);

        let seen = Rc::new(RefCell::new(Vec::new()));
        for (node, name) in [(outer, "outer"), (inner, "inner")] {
            let seen = seen.clone();
            let handler = Handler::new(move |_| seen.borrow_mut().push(name));
            host.patch_prop(node, "onClick", None, Some(&Value::Handler(handler)));
        }

        assert_eq!(host.dispatch(inner, "click", &[]), Ok(2));
        assert_eq!(*seen.borrow(), vec!["inner", "outer"]);
    }

    #[test]
    fn test_dispatch_errors() {
        let host = MemoryHost::new();
        let text = host.create_text("t");
        assert_eq!(host.dispatch(NodeId(99), "click", &[]), Err(HostError::UnknownNode(NodeId(99))));
        assert_eq!(host.dispatch(text, "click", &[]), Err(HostError::NotAnElement(text)));
    }
}
