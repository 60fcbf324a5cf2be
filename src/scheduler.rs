//! Job Scheduler - Batches repeated invalidations into one flush.
//!
//! A job is "rerun this component's render effect". Reactive writes inside one
//! synchronous task may invalidate the same component many times; the scheduler
//! keeps one queued copy of each job and runs it once when the host flushes.
//!
//! # Flush timing
//!
//! There is no ambient microtask queue, so the host drives the flush: queueing
//! marks a flush pending and the host calls [`Scheduler::flush`] once its current
//! synchronous work is done (the renderer exposes this as
//! [`Renderer::flush`](crate::Renderer::flush)).
//!
//! ```text
//! write → effect invalidated → queue_job(job)  ─┐
//! write → effect invalidated → (already queued) │  same task
//! host: flush() ──────────────────────────────  ┘→ job runs once
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

/// A unit of deferred work. Identity is the `Rc` allocation.
pub type Job = Rc<dyn Fn()>;

fn job_key(job: &Job) -> usize {
    Rc::as_ptr(job) as *const () as usize
}

// =============================================================================
// Scheduler
// =============================================================================

/// Deduplicating job queue with an explicit flush.
pub struct Scheduler {
    /// Queued jobs keyed by identity, in insertion order.
    queue: RefCell<IndexMap<usize, Job>>,
    /// Rest of the round being run; put back in front of the queue if the
    /// flush unwinds.
    running: RefCell<Vec<(usize, Job)>>,
    pending: Cell<bool>,
    flushing: Cell<bool>,
    max_rounds: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Scheduler {
    /// Create a scheduler that stops a flush after `max_rounds` rounds.
    pub fn new(max_rounds: usize) -> Self {
        Self {
            queue: RefCell::new(IndexMap::new()),
            running: RefCell::new(Vec::new()),
            pending: Cell::new(false),
            flushing: Cell::new(false),
            max_rounds: max_rounds.max(1),
        }
    }

    /// Queue a job for the next flush.
    ///
    /// Queueing the same job again before it runs is a no-op.
    pub fn queue_job(&self, job: Job) {
        self.queue.borrow_mut().entry(job_key(&job)).or_insert(job);
        if !self.pending.get() {
            self.pending.set(true);
            tracing::trace!("flush scheduled");
        }
    }

    /// Whether a flush is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Whether a flush is currently running.
    pub fn is_flushing(&self) -> bool {
        self.flushing.get()
    }

    /// Number of jobs waiting for the next round.
    pub fn queued_len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run every queued job once, in insertion order.
    ///
    /// Jobs queued while the flush runs are picked up by a following round of
    /// the same flush. Returns the number of jobs executed. Does nothing when no
    /// flush is pending or when called from inside a running job.
    ///
    /// A panicking job is not retried and its panic propagates. The jobs that
    /// had not run yet stay queued and the next flush runs them. The same goes
    /// for jobs left over when the round limit is hit.
    pub fn flush(&self) -> usize {
        if !self.pending.get() || self.flushing.get() {
            return 0;
        }
        self.flushing.set(true);
        let _guard = FlushGuard { scheduler: self };

        let mut executed = 0;
        let mut rounds = 0;
        while !self.queue.borrow().is_empty() {
            rounds += 1;
            if rounds > self.max_rounds {
                tracing::error!(
                    deferred = self.queued_len(),
                    rounds = self.max_rounds,
                    "maximum recursive updates exceeded; deferring queued jobs to the next flush"
                );
                break;
            }

            let batch = std::mem::take(&mut *self.queue.borrow_mut());
            *self.running.borrow_mut() = batch.into_iter().rev().collect();
            loop {
                let Some((_, job)) = self.running.borrow_mut().pop() else {
                    break;
                };
                job();
                executed += 1;
            }
        }

        tracing::trace!(executed, rounds, "flush complete");
        executed
    }
}

/// Ends a flush, including by panic: unrun jobs go back in front of the queue.
struct FlushGuard<'a> {
    scheduler: &'a Scheduler,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        let scheduler = self.scheduler;
        let unrun = std::mem::take(&mut *scheduler.running.borrow_mut());
        let mut queue = scheduler.queue.borrow_mut();
        if !unrun.is_empty() {
            let mut restored: IndexMap<usize, Job> = unrun.into_iter().rev().collect();
            for (key, job) in queue.drain(..) {
                restored.entry(key).or_insert(job);
            }
            *queue = restored;
        }
        scheduler.pending.set(!queue.is_empty());
        scheduler.flushing.set(false);
    }
}

// =============================================================================
// Tests
// =============================================================================
