//! Platform adapter - the capability set the engine drives.

use crate::types::{NodeId, Value};

/// Operations on a live presentation tree.
///
/// The engine never touches the tree directly; it only calls these. Nodes are
/// opaque [`NodeId`] handles minted by the adapter. Methods take `&self` so an
/// adapter can be shared as `Rc<dyn PlatformAdapter>` between the renderer and
/// the code that inspects or drives it.
pub trait PlatformAdapter {
    /// Create a detached element node.
    fn create_element(&self, tag: &str) -> NodeId;

    /// Create a detached text node.
    fn create_text(&self, text: &str) -> NodeId;

    /// Replace an element's content with a single run of text.
    fn set_element_text(&self, el: NodeId, text: &str);

    /// Change the text of a text node.
    fn set_text(&self, node: NodeId, text: &str);

    /// Insert `child` into `parent` before `anchor`, or append if `anchor` is `None`.
    fn insert(&self, child: NodeId, parent: NodeId, anchor: Option<NodeId>);

    /// Detach `child` from its parent, if it has one.
    fn remove(&self, child: NodeId);

    /// Apply one prop change. `next == None` removes the prop.
    fn patch_prop(&self, el: NodeId, key: &str, prev: Option<&Value>, next: Option<&Value>);
}
