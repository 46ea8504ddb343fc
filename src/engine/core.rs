use crate::engine::context;
use crate::engine::event::Event;
use crate::engine::sleep::Sleep;
use crate::fiber::frame::FrameHandle;
use crate::task::core::{bind_engine, Task};
use crate::timer::{SystemTimer, Timer};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Completion probe over a type-erased owned task.
pub(crate) trait DoneProbe {
    fn is_done(&self) -> bool;

    /// True when the task completed exceptionally and nobody ever awaited
    /// it; the sweep reports such failures instead of dropping them
    /// silently.
    fn failed_unobserved(&self) -> bool;
}

/// Shared state behind an [`Engine`] handle.
pub(crate) struct EngineCore {
    /// Timed wake-ups, in insertion order.
    events: RefCell<Vec<Event>>,

    /// Tasks whose lifetime the engine has assumed; swept once done.
    owned_tasks: RefCell<Vec<Box<dyn DoneProbe>>>,

    /// Clock used for deadlines and inter-round sleeps.
    clock: Rc<dyn Timer>,
}

impl EngineCore {
    pub(crate) fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Appends a wake-up for `handle` at absolute time `due`.
    ///
    /// No deduplication happens here; callers that must not double-queue
    /// a frame check [`is_scheduled`](Self::is_scheduled) first.
    pub(crate) fn schedule(&self, handle: FrameHandle, due: u64) {
        log::trace!("engine schedules frame {} at t={}", handle.id(), due);
        self.events.borrow_mut().push(Event { due, handle });
    }

    /// Whether `handle`'s frame is already queued.
    pub(crate) fn is_scheduled(&self, handle: &FrameHandle) -> bool {
        self.events
            .borrow()
            .iter()
            .any(|event| event.handle.same_frame(handle))
    }

    /// One scheduler tick: sleep until the nearest deadline, resume every
    /// due frame in insertion order, then sweep finished owned tasks.
    fn round(&self) {
        let least_due = self.events.borrow().iter().map(|event| event.due).min();

        if let Some(least_due) = least_due {
            let now = self.clock.now();
            if least_due > now {
                self.clock.sleep(least_due - now);
            }
        }
        let now = self.clock.now();

        // Snapshot the due entries before resuming: wake-ups scheduled
        // while a frame runs (completion continuations in particular)
        // belong to the next round.
        let ready: Vec<Event> = {
            let mut events = self.events.borrow_mut();
            let mut ready = Vec::new();
            let mut pending = Vec::with_capacity(events.len());
            for event in events.drain(..) {
                if event.due <= now {
                    ready.push(event);
                } else {
                    pending.push(event);
                }
            }
            *events = pending;
            ready
        };

        for event in ready {
            log::trace!("engine resumes frame {} at t={}", event.handle.id(), now);
            event.handle.resume();
        }

        self.owned_tasks.borrow_mut().retain(|task| {
            if !task.is_done() {
                return true;
            }
            if task.failed_unobserved() {
                log::error!("engine drops an owned task that failed unobserved");
            } else {
                log::trace!("engine drops a finished owned task");
            }
            false
        });
    }
}

/// The single-threaded cooperative scheduler.
///
/// An engine drives task frames to completion: [`run`](Self::run) sleeps
/// until the nearest deadline, resumes every due frame in insertion
/// order, and repeats until the event queue is empty. All interaction is
/// single-threaded — the engine, its tasks and its generators must stay
/// on the thread that runs them.
///
/// `Engine` is a cheap handle over shared state; clones refer to the same
/// scheduler, so a task body can capture one to schedule further tasks.
///
/// # Example
///
/// ```rust,ignore
/// let engine = Engine::new();
/// let task = Task::new(|co| async move {
///     co.sleep(1000).await;
/// });
/// engine.schedule_task(&task, 0);
/// engine.run();
/// ```
#[derive(Clone)]
pub struct Engine {
    core: Rc<EngineCore>,
}

impl Engine {
    /// Creates an engine on the wall clock.
    pub fn new() -> Self {
        Self::with_timer(Rc::new(SystemTimer::new()))
    }

    /// Creates an engine on a caller-supplied clock.
    pub fn with_timer(clock: Rc<dyn Timer>) -> Self {
        Self {
            core: Rc::new(EngineCore {
                events: RefCell::new(Vec::new()),
                owned_tasks: RefCell::new(Vec::new()),
                clock,
            }),
        }
    }

    pub(crate) fn core(&self) -> &Rc<EngineCore> {
        &self.core
    }

    pub(crate) fn downgrade(&self) -> Weak<EngineCore> {
        Rc::downgrade(&self.core)
    }

    /// Queues a wake-up for `handle` at absolute engine time `due`.
    ///
    /// The queue holds each frame at most once by convention: callers
    /// check [`is_scheduled`](Self::is_scheduled) before scheduling a
    /// frame that might already be queued.
    pub fn schedule(&self, handle: FrameHandle, due: u64) {
        self.core.schedule(handle, due);
    }

    /// Whether `handle`'s frame is currently queued.
    pub fn is_scheduled(&self, handle: &FrameHandle) -> bool {
        self.core.is_scheduled(handle)
    }

    /// Binds `task` to this engine and queues it `after` milliseconds
    /// from now.
    pub fn schedule_task<T: 'static>(&self, task: &Task<T>, after: u64) {
        task.set_engine(self);
        let due = self.core.now().saturating_add(after);
        self.core.schedule(task.frame_handle(), due);
    }

    /// Returns an awaiter that suspends the calling frame until `ms`
    /// milliseconds from now on this engine's clock.
    pub fn sleep(&self, ms: u64) -> Sleep {
        let deadline = self.core.now().saturating_add(ms);
        Sleep::with_engine(self.downgrade(), deadline)
    }

    /// Assumes ownership of `task`: the engine keeps it alive until it is
    /// done and drops it during the post-round sweep.
    ///
    /// The task is bound to this engine, so handing a task over never
    /// trips the hanging-task check.
    pub fn transfer_ownership<T: 'static>(&self, task: Task<T>) {
        bind_engine(task.promise_cell(), &self.core);
        self.core.owned_tasks.borrow_mut().push(Box::new(task));
    }

    /// Drives rounds until the event queue is empty.
    ///
    /// Installs this engine as the thread's ambient engine for the
    /// duration.
    ///
    /// # Panics
    ///
    /// Panics when called while an engine (including this one) is already
    /// running on the thread.
    pub fn run(&self) {
        let _guard = context::enter_run(self);
        while !self.core.events.borrow().is_empty() {
            self.core.round();
        }
    }

    /// Executes a single scheduler tick.
    ///
    /// # Panics
    ///
    /// Panics when a different engine is already running on the thread.
    pub fn run_one_round(&self) {
        let _guard = context::enter_round(self);
        self.core.round();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
