//! Core types for spark-vdom.
//!
//! These types flow through every layer: virtual nodes carry [`Value`]s in their
//! props, component state is a [`Record`] of values, and the platform adapter hands
//! out [`NodeId`]s for the live nodes it owns.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

// =============================================================================
// Node Handles
// =============================================================================

/// Handle to a live node owned by the platform adapter.
///
/// The engine never looks inside a node. It only passes handles back to the
/// adapter that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Handler
// =============================================================================

/// A callable prop value (event listener, emitted-event handler).
///
/// Handlers compare by identity: two handlers are equal only when they are
/// clones of the same allocation. This is what makes a re-created closure
/// count as a changed prop.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&[Value])>);

impl Handler {
    /// Wrap a closure as a handler.
    pub fn new(f: impl Fn(&[Value]) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the handler with a payload.
    pub fn call(&self, payload: &[Value]) {
        (self.0)(payload)
    }

    /// Whether both handles point at the same closure.
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

// =============================================================================
// Value
// =============================================================================

/// A dynamically typed prop/state value.
///
/// `Null` doubles as the "undefined" result of a failed render-context read and
/// as the "removed" marker in prop patches.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Handler(Handler),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Handlers carried by this value: one for `Handler`, each handler of a
    /// `List`, none otherwise.
    pub fn handlers(&self) -> Vec<Handler> {
        match self {
            Value::Handler(h) => vec![h.clone()],
            Value::List(items) => items.iter().filter_map(|v| v.as_handler().cloned()).collect(),
            _ => Vec::new(),
        }
    }

    /// Text form used when a value lands in a text or attribute slot.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(x) => x.to_string(),
            Value::Str(s) => s.clone(),
            Value::List(items) => items.iter().map(Value::to_text).collect::<Vec<_>>().join(","),
            Value::Handler(_) => "[handler]".to_string(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Handler> for Value {
    fn from(value: Handler) -> Self {
        Value::Handler(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

// =============================================================================
// Record
// =============================================================================

/// Ordered name → value mapping with unique keys.
///
/// Used for element props, component prop bags, component state and setup
/// bindings. Iteration follows insertion order.
pub type Record = IndexMap<String, Value>;

/// Build a [`Record`] from `key => value` pairs.
///
/// ```
/// use spark_vdom::{record, Value};
///
/// let r = record! { "count" => 1, "label" => "hi" };
/// assert_eq!(r["count"], Value::Int(1));
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $( record.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        record
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_handler_identity() {
        let a = Handler::new(|_| {});
        let b = a.clone();
        let c = Handler::new(|_| {});

        assert_eq!(Value::Handler(a.clone()), Value::Handler(b));
        assert_ne!(Value::Handler(a), Value::Handler(c));
    }

    #[test]
    fn test_handlers_from_list() {
        let hits = Rc::new(Cell::new(0));
        let h1 = {
            let hits = hits.clone();
            Handler::new(move |_| hits.set(hits.get() + 1))
        };
        let h2 = {
            let hits = hits.clone();
            Handler::new(move |_| hits.set(hits.get() + 10))
        };

        let value = Value::List(vec![h1.into(), Value::Int(3), h2.into()]);
        for handler in value.handlers() {
            handler.call(&[]);
        }
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn test_record_macro_keeps_order() {
        let r = record! { "b" => 2, "a" => "x", "c" => true };
        let keys: Vec<_> = r.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(r["a"], Value::Str("x".into()));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Int(4).to_text(), "4");
        assert_eq!(Value::from(vec![1, 2]).to_text(), "1,2");
    }
}
