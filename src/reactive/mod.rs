//! Reactivity substrate adapter.
//!
//! The engine talks to [spark-signals](https://github.com/RLabs-Inc/spark-signals)
//! through two interface points only:
//!
//! - **Records** - [`reactive`], [`shallow_reactive`] and [`shallow_readonly`]
//!   wrap plain [`Record`](crate::Record)s so reads inside a computation subscribe
//!   it and writes rerun it.
//! - **Tracked computations** - [`run_tracked`] runs a body and keeps it
//!   subscribed, optionally routing reruns through a scheduler.

mod effect;
mod record;

pub use effect::{EffectHandle, SchedulerHook, run_tracked};
pub use record::{ReadonlyRecord, Reactive, reactive, shallow_reactive, shallow_readonly, untracked};
