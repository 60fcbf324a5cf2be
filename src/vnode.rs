//! Virtual nodes - declarative descriptions of the presentation tree.
//!
//! A [`VNode`] describes one element, one component invocation, or a fragment
//! (a bare list of sibling nodes). Nodes are shared as [`VNodeRef`]
//! (`Rc<VNode>`); the engine writes back the live node handle (`el`) and the
//! component instance into interior cells as it mounts.
//!
//! # Example
//!
//! ```
//! use spark_vdom::{h, Value};
//!
//! let tree = h("ul")
//!     .prop("class", "menu")
//!     .child(h("li").text("one").build())
//!     .child(h("li").text("two").build())
//!     .build();
//!
//! assert_eq!(tree.props()["class"], Value::from("menu"));
//! assert_eq!(tree.child_nodes().len(), 2);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::component::{Component, ComponentInstance};
use crate::types::{NodeId, Record, Value};

/// Shared handle to a virtual node. Identity is the allocation.
pub type VNodeRef = Rc<VNode>;

/// Render function for one named slot.
pub type SlotFn = Rc<dyn Fn() -> VNodeRef>;

/// Slot name → render function, passed as a component VNode's children.
pub type Slots = Rc<IndexMap<String, SlotFn>>;

// =============================================================================
// Kind & Children
// =============================================================================

/// What a virtual node describes.
#[derive(Clone)]
pub enum VNodeKind {
    /// A host element with the given tag.
    Element(String),
    /// A component invocation. Two nodes have the same component type only when
    /// they point at the same descriptor allocation.
    Component(Rc<Component>),
    /// A list of sibling nodes mounted into the parent's container.
    Fragment(Vec<VNodeRef>),
}

impl VNodeKind {
    /// Same-type test used by `patch` to decide between diffing and remounting.
    pub fn same_type(&self, other: &VNodeKind) -> bool {
        match (self, other) {
            (VNodeKind::Element(a), VNodeKind::Element(b)) => a == b,
            (VNodeKind::Component(a), VNodeKind::Component(b)) => Rc::ptr_eq(a, b),
            (VNodeKind::Fragment(_), VNodeKind::Fragment(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for VNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNodeKind::Element(tag) => write!(f, "Element({tag})"),
            VNodeKind::Component(c) => write!(f, "Component({})", c.name),
            VNodeKind::Fragment(nodes) => f.debug_tuple("Fragment").field(nodes).finish(),
        }
    }
}

/// Children of a virtual node.
#[derive(Clone, Default)]
pub enum Children {
    #[default]
    None,
    /// Text content of an element.
    Text(String),
    /// Child nodes of an element.
    Nodes(Vec<VNodeRef>),
    /// Named slots of a component.
    Slots(Slots),
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Children::None => write!(f, "None"),
            Children::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Children::Nodes(nodes) => f.debug_tuple("Nodes").field(nodes).finish(),
            Children::Slots(slots) => f.debug_list().entries(slots.keys()).finish(),
        }
    }
}

// =============================================================================
// VNode
// =============================================================================

/// One desired presentation node or component invocation.
pub struct VNode {
    kind: VNodeKind,
    props: Record,
    children: Children,
    el: Cell<Option<NodeId>>,
    component: RefCell<Option<Rc<ComponentInstance>>>,
}

impl VNode {
    pub fn new(kind: VNodeKind, props: Record, children: Children) -> VNodeRef {
        Rc::new(Self {
            kind,
            props,
            children,
            el: Cell::new(None),
            component: RefCell::new(None),
        })
    }

    pub fn kind(&self) -> &VNodeKind {
        &self.kind
    }

    pub fn props(&self) -> &Record {
        &self.props
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    /// Child nodes, empty unless children are `Children::Nodes`.
    pub fn child_nodes(&self) -> &[VNodeRef] {
        match &self.children {
            Children::Nodes(nodes) => nodes,
            _ => &[],
        }
    }

    /// Live node created for this element, set once mounted.
    pub fn el(&self) -> Option<NodeId> {
        self.el.get()
    }

    pub(crate) fn set_el(&self, el: Option<NodeId>) {
        self.el.set(el);
    }

    /// Component instance produced by mounting this node.
    pub fn component(&self) -> Option<Rc<ComponentInstance>> {
        self.component.borrow().clone()
    }

    pub(crate) fn set_component(&self, instance: Option<Rc<ComponentInstance>>) {
        *self.component.borrow_mut() = instance;
    }

    pub fn same_type(&self, other: &VNode) -> bool {
        self.kind.same_type(&other.kind)
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNode")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .field("children", &self.children)
            .field("el", &self.el.get())
            .finish()
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Start an element node.
pub fn h(tag: impl Into<String>) -> VNodeBuilder {
    VNodeBuilder::new(VNodeKind::Element(tag.into()))
}

/// Start a component node.
pub fn component(descriptor: &Rc<Component>) -> VNodeBuilder {
    VNodeBuilder::new(VNodeKind::Component(descriptor.clone()))
}

/// Build a fragment from sibling nodes.
pub fn fragment(nodes: impl IntoIterator<Item = VNodeRef>) -> VNodeRef {
    VNode::new(
        VNodeKind::Fragment(nodes.into_iter().collect()),
        Record::new(),
        Children::None,
    )
}

/// Incremental builder for a [`VNode`].
pub struct VNodeBuilder {
    kind: VNodeKind,
    props: Record,
    children: Children,
}

impl VNodeBuilder {
    fn new(kind: VNodeKind) -> Self {
        Self {
            kind,
            props: Record::new(),
            children: Children::None,
        }
    }

    /// Set one prop.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Merge a whole record of props.
    pub fn props(mut self, props: Record) -> Self {
        self.props.extend(props);
        self
    }

    /// Replace children with text content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children = Children::Text(text.into());
        self
    }

    /// Append one child node.
    pub fn child(mut self, node: VNodeRef) -> Self {
        match &mut self.children {
            Children::Nodes(nodes) => nodes.push(node),
            _ => self.children = Children::Nodes(vec![node]),
        }
        self
    }

    /// Append child nodes.
    pub fn children(mut self, nodes: impl IntoIterator<Item = VNodeRef>) -> Self {
        for node in nodes {
            self = self.child(node);
        }
        self
    }

    /// Add a named slot.
    pub fn slot(mut self, name: impl Into<String>, render: impl Fn() -> VNodeRef + 'static) -> Self {
        let mut slots = match &self.children {
            Children::Slots(slots) => (**slots).clone(),
            _ => IndexMap::new(),
        };
        slots.insert(name.into(), Rc::new(render) as SlotFn);
        self.children = Children::Slots(Rc::new(slots));
        self
    }

    pub fn build(self) -> VNodeRef {
        VNode::new(self.kind, self.props, self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_same_type_by_tag() {
        let a = h("div").build();
        let b = h("div").text("x").build();
        let c = h("span").build();
        assert!(a.same_type(&b));
        assert!(!a.same_type(&c));
    }

    #[test]
    fn test_same_type_by_descriptor_identity() {
        let first = Rc::new(Component::named("Same"));
        let second = Rc::new(Component::named("Same"));

        let a = component(&first).build();
        let b = component(&first).prop("x", 1).build();
        let c = component(&second).build();
        assert!(a.same_type(&b));
        assert!(!a.same_type(&c), "equal names are not the same type");
    }

    #[test]
    fn test_fragment_and_element_differ() {
        let f = fragment(vec![h("p").build()]);
        assert!(f.same_type(&fragment(Vec::new())));
        assert!(!f.same_type(&h("p").build()));
    }

    #[test]
    fn test_builder_children_and_props() {
        let node = h("div")
            .props(record! { "id" => "root" })
            .prop("title", "t")
            .children(vec![h("a").build(), h("b").build()])
            .build();

        assert_eq!(node.props().len(), 2);
        assert_eq!(node.child_nodes().len(), 2);
        assert!(node.el().is_none());
        assert!(node.component().is_none());
    }

    #[test]
    fn test_builder_slots() {
        let desc = Rc::new(Component::named("Card"));
        let node = component(&desc)
            .slot("header", || h("h1").text("Title").build())
            .slot("body", || h("p").build())
            .build();

        let Children::Slots(slots) = node.children() else {
            panic!("expected slots");
        };
        assert_eq!(slots.keys().cloned().collect::<Vec<_>>(), vec!["header", "body"]);
        let header = (slots["header"])();
        assert!(matches!(header.children(), Children::Text(t) if t == "Title"));
    }
}
