//! Tracked computations with an optional scheduler.
//!
//! Built on a spark-signals `effect_sync` held under its own `effect_root`, so
//! a computation created while another one runs (a child component mounted by
//! its parent's render) is not torn down when the outer one reruns. Only
//! [`EffectHandle::stop`] ends it.
//!
//! Without a scheduler the body simply reruns whenever something it read
//! changes. With a scheduler the rerun is split in two phases:
//!
//! 1. **Invalidation** - the effect wakes up, hands its [`Job`] to the scheduler
//!    and subscribes only to its private trigger signal.
//! 2. **Job** - when the scheduler runs the job, it bumps the trigger; the effect
//!    wakes again and runs the body, tracked, re-subscribing to its real
//!    dependencies.
//!
//! Between the two phases further writes find nothing subscribed, so they cannot
//! queue the computation twice.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::rc::Rc;

use spark_signals::{effect_root, effect_sync, signal};

use super::record::tracked;
use crate::scheduler::Job;

/// Receives the computation's job on invalidation.
pub type SchedulerHook = Rc<dyn Fn(Job)>;

type PanicSlot = Rc<RefCell<Option<Box<dyn Any + Send>>>>;

/// Handle to a running tracked computation.
pub struct EffectHandle {
    stopped: Rc<Cell<bool>>,
    alive: Rc<Cell<bool>>,
    stop: RefCell<Option<Box<dyn FnOnce()>>>,
    job: Job,
}

impl EffectHandle {
    /// Permanently stop the computation.
    pub fn stop(&self) {
        self.stopped.set(true);
        if let Some(stop) = self.stop.borrow_mut().take() {
            stop();
        }
    }

    /// Whether the computation no longer reacts to anything.
    ///
    /// True after [`stop`](Self::stop), and also once spark-signals has
    /// destroyed the underlying effect by any other route.
    pub fn is_stopped(&self) -> bool {
        self.stopped.get() || !self.alive.get()
    }

    /// The job this computation hands to its scheduler.
    ///
    /// Running it directly forces a tracked rerun of the body.
    pub fn job(&self) -> Job {
        self.job.clone()
    }
}

/// The body and its liveness flag, owned by the spark-signals effect.
///
/// Dropped when spark-signals destroys the effect.
struct Computation<F> {
    body: RefCell<F>,
    alive: Rc<Cell<bool>>,
}

impl<F: FnMut()> Computation<F> {
    /// Run the body, catching a panic. `None` when the body is already running.
    fn run(&self) -> Option<Result<(), Box<dyn Any + Send>>> {
        let mut body = self.body.try_borrow_mut().ok()?;
        Some(catch_unwind(AssertUnwindSafe(|| (*body)())))
    }
}

impl<F> Drop for Computation<F> {
    fn drop(&mut self) {
        self.alive.set(false);
    }
}

/// Run `body` now, tracking its reads, and keep it subscribed.
///
/// When `scheduler` is given, invalidations are routed to it as a stable job
/// instead of rerunning `body` synchronously.
///
/// spark-signals does not restore its context when a panic unwinds through an
/// effect, so a panicking body is caught inside the effect and resumed from the
/// caller that made it run: `run_tracked` itself for the first run, the job for
/// scheduled reruns. A panic during an unscheduled rerun is logged and dropped.
pub fn run_tracked<F>(body: F, scheduler: Option<SchedulerHook>) -> EffectHandle
where
    F: FnMut() + 'static,
{
    let trigger = signal(0u64);
    let generation = Rc::new(Cell::new(0u64));
    let forced = Rc::new(Cell::new(false));
    let started = Rc::new(Cell::new(false));
    let stopped = Rc::new(Cell::new(false));
    let alive = Rc::new(Cell::new(true));
    let panicked: PanicSlot = Rc::new(RefCell::new(None));

    let job: Job = {
        let trigger = trigger.clone();
        let forced = forced.clone();
        let stopped = stopped.clone();
        let panicked = panicked.clone();
        Rc::new(move || {
            if stopped.get() {
                return;
            }
            forced.set(true);
            generation.set(generation.get() + 1);
            trigger.set(generation.get());
            let payload = panicked.borrow_mut().take();
            if let Some(payload) = payload {
                resume_unwind(payload);
            }
        })
    };

    let computation = Computation {
        body: RefCell::new(body),
        alive: alive.clone(),
    };
    let job_for_effect = job.clone();
    let stopped_for_effect = stopped.clone();
    let panicked_for_effect = panicked.clone();
    let stop = effect_root(move || {
        let _ = effect_sync(move || {
            tracked(|| {
                let _ = trigger.get();
                if stopped_for_effect.get() {
                    return;
                }

                let first_run = !started.replace(true);
                let run_now = first_run || forced.replace(false) || scheduler.is_none();
                if !run_now {
                    if let Some(schedule) = &scheduler {
                        schedule(job_for_effect.clone());
                    }
                    return;
                }

                match computation.run() {
                    Some(Ok(())) => {}
                    Some(Err(payload)) => {
                        if first_run || scheduler.is_some() {
                            *panicked_for_effect.borrow_mut() = Some(payload);
                        } else {
                            tracing::error!("tracked computation panicked during a rerun");
                        }
                    }
                    // Invalidated by its own body: defer instead of re-entering.
                    None => {
                        if let Some(schedule) = &scheduler {
                            schedule(job_for_effect.clone());
                        }
                    }
                }
            })
        });
    });

    let handle = EffectHandle {
        stopped,
        alive,
        stop: RefCell::new(Some(Box::new(stop))),
        job,
    };
    let payload = panicked.borrow_mut().take();
    if let Some(payload) = payload {
        handle.stop();
        resume_unwind(payload);
    }
    handle
}
