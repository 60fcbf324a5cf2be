//! Reconciliation against the in-memory host: element mount/patch/unmount,
//! prop diffing and the unkeyed children policy.

use std::rc::Rc;

use spark_vdom::{HostOp, MemoryHost, NodeId, Renderer, Value, fragment, h};

fn setup() -> (Rc<MemoryHost>, NodeId, Renderer) {
    let host = Rc::new(MemoryHost::new());
    let root = host.create_root("root");
    let renderer = Renderer::new(host.clone());
    (host, root, renderer)
}

fn count(ops: &[HostOp], pred: impl Fn(&HostOp) -> bool) -> usize {
    ops.iter().filter(|op| pred(*op)).count()
}

// =============================================================================
// Render entry point
// =============================================================================

#[test]
fn test_mount_builds_tree() {
    let (host, root, renderer) = setup();
    let tree = h("ul")
        .prop("class", "menu")
        .prop("id", "nav")
        .child(h("li").text("one").build())
        .child(h("li").text("two").build())
        .build();

    renderer.render(Some(tree.clone()), root);

    assert_eq!(
        host.serialize(root),
        "<root><ul class=\"menu\" id=\"nav\"><li>one</li><li>two</li></ul></root>"
    );
    let ul = tree.el().expect("mounted");
    assert_eq!(host.parent(ul), Some(root));
    assert_eq!(tree.child_nodes()[0].el().and_then(|li| host.parent(li)), Some(ul));
    assert!(renderer.root(root).is_some_and(|r| Rc::ptr_eq(&r, &tree)));
}

#[test]
fn test_element_children_mount_before_insert() {
    let (host, root, renderer) = setup();
    renderer.render(Some(h("div").prop("title", "t").child(h("span").build()).build()), root);

    let ops = host.take_ops();
    // create div, create span, insert span into div, patch title, insert div
    assert!(matches!(&ops[0], HostOp::CreateElement { tag, .. } if tag == "div"));
    assert!(matches!(&ops[1], HostOp::CreateElement { tag, .. } if tag == "span"));
    assert!(matches!(&ops[2], HostOp::Insert { parent, .. } if *parent != root));
    assert!(matches!(&ops[3], HostOp::PatchProp { key, prev: None, .. } if key == "title"));
    assert!(matches!(&ops[4], HostOp::Insert { parent, anchor: None, .. } if *parent == root));
    assert_eq!(ops.len(), 5);
}

#[test]
fn test_render_same_tree_twice_is_idempotent() {
    let (host, root, renderer) = setup();
    let tree = h("div")
        .prop("id", "a")
        .child(h("span").text("x").build())
        .build();

    renderer.render(Some(tree.clone()), root);
    assert!(!host.take_ops().is_empty());

    renderer.render(Some(tree), root);
    assert!(host.ops().is_empty());
    assert_eq!(renderer.flush(), 0);
}

#[test]
fn test_render_none_unmounts() {
    let (host, root, renderer) = setup();
    renderer.render(Some(h("div").build()), root);
    host.clear_ops();

    renderer.render(None, root);
    assert_eq!(host.serialize(root), "<root></root>");
    assert_eq!(count(&host.take_ops(), HostOp::is_remove), 1);
    assert!(renderer.root(root).is_none());

    // Nothing stored, nothing to do
    renderer.render(None, root);
    assert!(host.ops().is_empty());
}

#[test]
fn test_containers_are_independent() {
    let (host, first, renderer) = setup();
    let second = host.create_root("other");

    renderer.render(Some(h("a").build()), first);
    renderer.render(Some(h("b").build()), second);
    renderer.render(None, first);

    assert_eq!(host.serialize(first), "<root></root>");
    assert_eq!(host.serialize(second), "<other><b></b></other>");
}

// =============================================================================
// Type changes
// =============================================================================

#[test]
fn test_type_change_forces_remount() {
    let (host, root, renderer) = setup();
    let div = h("div").text("same").build();
    renderer.render(Some(div.clone()), root);
    host.clear_ops();

    renderer.render(Some(h("span").text("same").build()), root);

    let ops = host.take_ops();
    assert_eq!(count(&ops, HostOp::is_remove), 1);
    assert_eq!(count(&ops, HostOp::is_create), 1);
    let remove_at = ops.iter().position(HostOp::is_remove).expect("remove");
    let create_at = ops.iter().position(HostOp::is_create).expect("create");
    assert!(remove_at < create_at, "old node goes first");
    assert!(matches!(&ops[remove_at], HostOp::Remove { child } if Some(*child) == div.el()));
    assert_eq!(host.serialize(root), "<root><span>same</span></root>");
}

#[test]
fn test_element_patch_reuses_node() {
    let (host, root, renderer) = setup();
    let first = h("p").text("a").build();
    renderer.render(Some(first.clone()), root);
    host.clear_ops();

    let second = h("p").text("b").build();
    renderer.render(Some(second.clone()), root);

    assert_eq!(second.el(), first.el());
    let el = second.el().expect("mounted");
    assert_eq!(
        host.take_ops(),
        vec![HostOp::SetElementText {
            el,
            text: "b".into()
        }]
    );
}

// =============================================================================
// Props
// =============================================================================

#[test]
fn test_props_diff_is_precise() {
    let (host, root, renderer) = setup();
    renderer.render(Some(h("div").prop("a", 1).prop("b", 2).build()), root);
    host.clear_ops();

    let next = h("div").prop("a", 1).prop("c", 3).build();
    renderer.render(Some(next.clone()), root);

    let el = next.el().expect("mounted");
    assert_eq!(
        host.take_ops(),
        vec![
            HostOp::PatchProp {
                el,
                key: "c".into(),
                prev: None,
                next: Some(Value::Int(3)),
            },
            HostOp::PatchProp {
                el,
                key: "b".into(),
                prev: Some(Value::Int(2)),
                next: None,
            },
        ]
    );
    assert_eq!(host.attribute(el, "a").as_deref(), Some("1"));
    assert_eq!(host.attribute(el, "b"), None);
    assert_eq!(host.attribute(el, "c").as_deref(), Some("3"));
}

#[test]
fn test_changed_prop_passes_previous_value() {
    let (host, root, renderer) = setup();
    renderer.render(Some(h("input").prop("value", "x").build()), root);
    host.clear_ops();

    let next = h("input").prop("value", "y").build();
    renderer.render(Some(next.clone()), root);

    let el = next.el().expect("mounted");
    assert_eq!(
        host.take_ops(),
        vec![HostOp::PatchProp {
            el,
            key: "value".into(),
            prev: Some(Value::from("x")),
            next: Some(Value::from("y")),
        }]
    );
    assert_eq!(host.property(el, "value"), Some(Value::from("y")));
}

// =============================================================================
// Children
// =============================================================================

#[test]
fn test_unkeyed_children_replace_all() {
    let (host, root, renderer) = setup();
    let item = |label: &str| h("li").text(label).build();

    let first = h("ul").children([item("X"), item("Y")]).build();
    renderer.render(Some(first.clone()), root);
    let ul = first.el().expect("mounted");
    let old_children = host.children(ul);
    host.clear_ops();

    renderer.render(Some(h("ul").children([item("Y"), item("X")]).build()), root);

    let ops = host.take_ops();
    assert_eq!(count(&ops, HostOp::is_remove), 2);
    assert_eq!(count(&ops, HostOp::is_create), 2);
    let new_children = host.children(ul);
    assert_eq!(new_children.len(), 2);
    assert!(new_children.iter().all(|c| !old_children.contains(c)), "no reuse");
    assert_eq!(host.serialize(root), "<root><ul><li>Y</li><li>X</li></ul></root>");
}

#[test]
fn test_text_to_children() {
    let (host, root, renderer) = setup();
    renderer.render(Some(h("p").text("a").build()), root);
    host.clear_ops();

    let next = h("p").child(h("b").build()).build();
    renderer.render(Some(next.clone()), root);

    let ops = host.take_ops();
    assert_eq!(
        ops[0],
        HostOp::SetElementText {
            el: next.el().expect("mounted"),
            text: String::new()
        }
    );
    assert_eq!(count(&ops, HostOp::is_create), 1);
    assert_eq!(host.serialize(root), "<root><p><b></b></p></root>");
}

#[test]
fn test_children_to_text() {
    let (host, root, renderer) = setup();
    renderer.render(Some(h("p").children([h("a").build(), h("b").build()]).build()), root);
    host.clear_ops();

    renderer.render(Some(h("p").text("t").build()), root);

    assert_eq!(count(&host.take_ops(), HostOp::is_remove), 2);
    assert_eq!(host.serialize(root), "<root><p>t</p></root>");
}

#[test]
fn test_children_to_absent() {
    let (host, root, renderer) = setup();
    renderer.render(Some(h("p").child(h("a").build()).build()), root);
    host.clear_ops();

    renderer.render(Some(h("p").build()), root);

    assert_eq!(count(&host.take_ops(), HostOp::is_remove), 1);
    assert_eq!(host.serialize(root), "<root><p></p></root>");
}

#[test]
fn test_text_to_absent_clears_text() {
    let (host, root, renderer) = setup();
    renderer.render(Some(h("p").text("gone").build()), root);
    host.clear_ops();

    let next = h("p").build();
    renderer.render(Some(next.clone()), root);

    assert_eq!(
        host.take_ops(),
        vec![HostOp::SetElementText {
            el: next.el().expect("mounted"),
            text: String::new()
        }]
    );
    assert_eq!(host.serialize(root), "<root><p></p></root>");
}

#[test]
fn test_absent_to_absent_is_noop() {
    let (host, root, renderer) = setup();
    renderer.render(Some(h("p").build()), root);
    host.clear_ops();

    renderer.render(Some(h("p").build()), root);
    assert!(host.ops().is_empty());
}

// =============================================================================
// Fragments
// =============================================================================

#[test]
fn test_fragment_mounts_members_into_container() {
    let (host, root, renderer) = setup();
    renderer.render(Some(fragment([h("a").build(), h("b").build()])), root);
    assert_eq!(host.serialize(root), "<root><a></a><b></b></root>");

    renderer.render(Some(fragment([h("c").build()])), root);
    assert_eq!(host.serialize(root), "<root><c></c></root>");

    renderer.render(None, root);
    assert_eq!(host.serialize(root), "<root></root>");
}

#[test]
fn test_fragment_as_child() {
    let (host, root, renderer) = setup();
    let tree = h("div")
        .child(h("h1").build())
        .child(fragment([h("p").text("1").build(), h("p").text("2").build()]))
        .build();

    renderer.render(Some(tree), root);
    assert_eq!(host.serialize(root), "<root><div><h1></h1><p>1</p><p>2</p></div></root>");
}

#[test]
fn test_fragment_replaced_by_element() {
    let (host, root, renderer) = setup();
    renderer.render(Some(fragment([h("a").build(), h("b").build()])), root);
    host.clear_ops();

    renderer.render(Some(h("main").build()), root);

    assert_eq!(count(&host.take_ops(), HostOp::is_remove), 2);
    assert_eq!(host.serialize(root), "<root><main></main></root>");
}
