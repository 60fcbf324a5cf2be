//! Prop resolution - splitting a caller's prop bag into props and attrs.

use crate::config::RendererOptions;
use crate::types::Record;

use super::descriptor::Component;

/// Partition `bag` into `(props, attrs)`.
///
/// A key is a prop when the descriptor declares it or when it carries the event
/// prefix (`onChange` is always a prop, so `emit` can find it). Everything else
/// is an attr. Both halves keep the bag's order.
pub fn resolve_props(descriptor: &Component, bag: &Record, options: &RendererOptions) -> (Record, Record) {
    let mut props = Record::new();
    let mut attrs = Record::new();
    for (key, value) in bag {
        if descriptor.declares(key) || options.is_event_key(key) {
            props.insert(key.clone(), value.clone());
        } else {
            attrs.insert(key.clone(), value.clone());
        }
    }
    (props, attrs)
}

/// Whether a component's prop bag changed between two renders.
///
/// Changed means a different number of keys or any key whose value differs.
pub fn has_props_changed(prev: &Record, next: &Record) -> bool {
    if prev.len() != next.len() {
        return true;
    }
    next.iter().any(|(key, value)| prev.get(key) != Some(value))
}
