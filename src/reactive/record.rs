//! Reactive records - name → value maps that participate in tracking.
//!
//! A record keeps its data in a plain `RefCell` and pairs it with a version
//! [`Signal`]. Tracked reads subscribe to the version, effective writes bump it.
//! Subscribing at record granularity keeps the substrate contract small: the
//! engine only needs "reads inside a computation subscribe it, writes rerun it".

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use spark_signals::{Signal, signal, untrack, with_context};

use crate::types::{Record, Value};

// =============================================================================
// Untracked Regions
// =============================================================================

/// Run `f` without subscribing the running computation to anything it reads.
///
/// Covers raw spark-signals reads as well as record reads.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    untrack(f)
}

/// Run `f` with tracking enabled regardless of enclosing `untracked` regions.
///
/// spark-signals keeps the untracking flag while it runs an effect, so tracked
/// computations wrap their own body in this.
pub(crate) fn tracked<T>(f: impl FnOnce() -> T) -> T {
    let prev = with_context(|ctx| ctx.set_untracking(false));
    let _restore = UntrackingGuard(prev);
    f()
}

/// Puts the untracking flag back, including on unwind.
struct UntrackingGuard(bool);

impl Drop for UntrackingGuard {
    fn drop(&mut self) {
        with_context(|ctx| ctx.set_untracking(self.0));
    }
}

// =============================================================================
// Reactive Record
// =============================================================================

struct Inner {
    data: RefCell<Record>,
    version: Signal<u64>,
    counter: Cell<u64>,
    shallow: bool,
}

/// A reactive wrapper over a [`Record`].
///
/// Clones share the same underlying record; [`Reactive::ptr_eq`] tells whether
/// two handles are the same record.
#[derive(Clone)]
pub struct Reactive {
    inner: Rc<Inner>,
}

/// Wrap a record so reads are tracked and writes (including in-place updates of
/// nested values) notify.
pub fn reactive(data: Record) -> Reactive {
    Reactive::new(data, false)
}

/// Wrap a record so reads are tracked and only top-level writes notify.
pub fn shallow_reactive(data: Record) -> Reactive {
    Reactive::new(data, true)
}

/// Read-only view over a reactive record.
pub fn shallow_readonly(record: &Reactive) -> ReadonlyRecord {
    ReadonlyRecord {
        record: record.clone(),
    }
}

impl Reactive {
    fn new(data: Record, shallow: bool) -> Self {
        Self {
            inner: Rc::new(Inner {
                data: RefCell::new(data),
                version: signal(0u64),
                counter: Cell::new(0),
                shallow,
            }),
        }
    }

    fn track(&self) {
        let _ = self.inner.version.get();
    }

    fn notify(&self) {
        let next = self.inner.counter.get() + 1;
        self.inner.counter.set(next);
        self.inner.version.set(next);
    }

    /// Whether this is a shallow record.
    pub fn is_shallow(&self) -> bool {
        self.inner.shallow
    }

    /// Read a value (tracked).
    pub fn get(&self, key: &str) -> Option<Value> {
        self.track();
        self.inner.data.borrow().get(key).cloned()
    }

    /// Whether the record holds `key` (tracked).
    pub fn contains_key(&self, key: &str) -> bool {
        self.track();
        self.inner.data.borrow().contains_key(key)
    }

    /// Keys in insertion order (tracked).
    pub fn keys(&self) -> Vec<String> {
        self.track();
        self.inner.data.borrow().keys().cloned().collect()
    }

    /// Number of entries (tracked).
    pub fn len(&self) -> usize {
        self.track();
        self.inner.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the whole record (tracked).
    pub fn snapshot(&self) -> Record {
        self.track();
        self.inner.data.borrow().clone()
    }

    /// Write a value. Returns whether the record changed.
    ///
    /// Writing a value equal to the current one is not a change.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let changed = {
            let mut data = self.inner.data.borrow_mut();
            match data.get(key) {
                Some(current) if *current == value => false,
                _ => {
                    data.insert(key.to_string(), value);
                    true
                }
            }
        };
        if changed {
            self.notify();
        }
        changed
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.inner.data.borrow_mut().shift_remove(key);
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    /// Mutate a value in place.
    ///
    /// Deep records notify when the value actually changed; shallow records
    /// never notify for in-place mutation. Returns false when the key is absent.
    pub fn update(&self, key: &str, f: impl FnOnce(&mut Value)) -> bool {
        let changed = {
            let mut data = self.inner.data.borrow_mut();
            let Some(slot) = data.get_mut(key) else {
                return false;
            };
            let before = slot.clone();
            f(slot);
            *slot != before
        };
        if changed && !self.inner.shallow {
            self.notify();
        }
        true
    }

    /// Whether both handles wrap the same record.
    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("data", &*self.inner.data.borrow())
            .field("shallow", &self.inner.shallow)
            .finish()
    }
}

// =============================================================================
// Readonly View
// =============================================================================

/// Read-only handle over a [`Reactive`] record.
///
/// Reads are tracked like reads on the record itself; there are no write methods.
#[derive(Clone, Debug)]
pub struct ReadonlyRecord {
    record: Reactive,
}

impl ReadonlyRecord {
    pub fn get(&self, key: &str) -> Option<Value> {
        self.record.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.record.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.record.keys()
    }

    pub fn snapshot(&self) -> Record {
        self.record.snapshot()
    }

    /// Whether this view reads from `record`.
    pub fn views(&self, record: &Reactive) -> bool {
        self.record.ptr_eq(record)
    }
}
