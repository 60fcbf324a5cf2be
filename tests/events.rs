//! Listener binding through the renderer, including the bound-at guard.

use std::cell::Cell;
use std::rc::Rc;

use spark_vdom::{Component, Handler, MemoryHost, Renderer, Value, component, h, record};

#[test]
fn test_listener_swapped_on_patch() {
    let host = Rc::new(MemoryHost::new());
    let root = host.create_root("root");
    let renderer = Renderer::new(host.clone());
    let hits = Rc::new(Cell::new(0));

    let make = |step: i32| {
        let hits = hits.clone();
        h("button")
            .prop("onClick", Handler::new(move |_| hits.set(hits.get() + step)))
            .build()
    };

    let first = make(1);
    renderer.render(Some(first.clone()), root);
    let button = first.el().expect("mounted");
    host.dispatch(button, "click", &[]).expect("dispatch");

    renderer.render(Some(make(10)), root);
    host.dispatch(button, "click", &[]).expect("dispatch");
    assert_eq!(hits.get(), 11);

    renderer.render(Some(h("button").build()), root);
    assert!(!host.has_listener(button, "click"));
    assert_eq!(host.dispatch(button, "click", &[]), Ok(0));
    assert_eq!(hits.get(), 11);
}

#[test]
fn test_handler_bound_during_dispatch_ignores_that_event() {
    let host = Rc::new(MemoryHost::new());
    let root = host.create_root("root");
    let renderer = Rc::new(Renderer::new(host.clone()));
    let outer_clicks = Rc::new(Cell::new(0));

    // Clicking the inner <p> flips `armed`, which gives the outer <div> a click
    // listener. The flip is flushed inside the handler, while the click is
    // still bubbling.
    let app = {
        let renderer = Rc::downgrade(&renderer);
        let outer_clicks = outer_clicks.clone();
        Rc::new(
            Component::named("App")
                .with_data(|| record! { "armed" => false })
                .with_render(move |ctx| {
                    let instance = Rc::downgrade(ctx.instance());
                    let renderer = renderer.clone();
                    let arm = Handler::new(move |_| {
                        if let Some(state) = instance.upgrade().and_then(|i| i.state().cloned()) {
                            state.set("armed", true);
                        }
                        if let Some(renderer) = renderer.upgrade() {
                            renderer.flush();
                        }
                    });

                    let mut outer = h("div");
                    if ctx.read("armed") == Value::Bool(true) {
                        let outer_clicks = outer_clicks.clone();
                        outer = outer.prop("onClick", Handler::new(move |_| outer_clicks.set(outer_clicks.get() + 1)));
                    }
                    outer.child(h("p").prop("onClick", arm).build()).build()
                }),
        )
    };

    renderer.render(Some(component(&app).build()), root);
    let div = host.children(root)[0];
    let p = host.children(div)[0];

    assert_eq!(host.dispatch(p, "click", &[]), Ok(1));
    assert!(host.has_listener(div, "click"), "listener attached by the flush");
    assert_eq!(outer_clicks.get(), 0, "bound after the event started");

    // A fresh click reaches both listeners
    let p = host.children(div)[0];
    assert_eq!(host.dispatch(p, "click", &[]), Ok(2));
    assert_eq!(outer_clicks.get(), 1);
}
