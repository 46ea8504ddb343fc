use crate::engine::core::{DoneProbe, EngineCore};
use crate::engine::sleep::{sleep, Sleep};
use crate::engine::Engine;
use crate::error::Error;
use crate::fiber::frame::{FiberFrame, FrameHandle, PanicPayload};
use crate::task::join::{Join, TaskHandle};
use crate::task::promise::TaskPromise;

use std::cell::RefCell;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::thread;

/// A one-shot asynchronous computation producing a `T`.
///
/// A task is created from a factory closure that receives a [`TaskCo`]
/// handle and returns the async body:
///
/// ```rust,ignore
/// let task = Task::new(|co| async move {
///     println!("hello");
///     co.sleep(1000).await;
///     println!("world");
/// });
///
/// let engine = Engine::new();
/// engine.schedule_task(&task, 0);
/// engine.run();
/// assert!(task.is_done());
/// ```
///
/// The task's frame is resumed only by the engine it is bound to. Binding
/// happens through [`Engine::schedule_task`], [`set_engine`](Self::set_engine),
/// [`Engine::transfer_ownership`], or implicitly when the task is first
/// awaited from another task.
///
/// # Panics
///
/// Dropping a task that was never awaited and never bound to an engine
/// panics with the [`Error::HangingTask`] message: its frame would be
/// leaked work nobody can ever observe.
///
/// [`Engine::schedule_task`]: crate::Engine::schedule_task
/// [`Engine::transfer_ownership`]: crate::Engine::transfer_ownership
pub struct Task<T = ()> {
    frame: FiberFrame,
    promise: Rc<RefCell<TaskPromise<T>>>,
}

impl<T: 'static> Task<T> {
    /// Creates a task from its body factory. Nothing runs until an engine
    /// resumes the task.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: FnOnce(TaskCo) -> Fut,
        Fut: Future<Output = T> + 'static,
    {
        let promise = Rc::new(RefCell::new(TaskPromise::new()));

        let body = factory(TaskCo { _private: () });

        let frame = FiberFrame::new(Box::pin(TaskFuture {
            body: Box::pin(body),
            promise: promise.clone(),
        }));

        Self { frame, promise }
    }

    /// True once the body has returned (or panicked).
    pub fn is_done(&self) -> bool {
        self.promise.borrow().done
    }

    /// The task's return value.
    ///
    /// Fails with [`Error::NoValueReturned`] until the task is done.
    pub fn result(&self) -> Result<T, Error>
    where
        T: Clone,
    {
        self.promise
            .borrow()
            .result
            .clone()
            .ok_or(Error::NoValueReturned)
    }

    /// Binds this task to `engine` without scheduling it.
    pub fn set_engine(&self, engine: &Engine) {
        self.promise.borrow_mut().engine = Some(engine.downgrade());
    }

    /// Returns a cheap, non-owning handle for awaiting this task from
    /// another task's body.
    pub fn handle(&self) -> TaskHandle<T> {
        TaskHandle::new(self.promise.clone(), self.frame.handle())
    }

    /// Handle to the task's frame, as accepted by [`Engine::schedule`].
    ///
    /// [`Engine::schedule`]: crate::Engine::schedule
    pub fn frame_handle(&self) -> FrameHandle {
        self.frame.handle()
    }

    pub(crate) fn promise_cell(&self) -> &Rc<RefCell<TaskPromise<T>>> {
        &self.promise
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        let promise = self.promise.borrow();
        if !promise.co_awaited && promise.engine.is_none() && !thread::panicking() {
            drop(promise);
            panic!("{}", Error::HangingTask);
        }
    }
}

impl<T: 'static> DoneProbe for Task<T> {
    fn is_done(&self) -> bool {
        Task::is_done(self)
    }

    fn failed_unobserved(&self) -> bool {
        let promise = self.promise.borrow();
        promise.error.is_some() && !promise.co_awaited
    }
}

/// Capability handle passed to a task body.
///
/// `TaskCo` carries no state: both suspension points resolve their engine
/// and their caller frame from the thread's ambient context at poll time,
/// which is only populated while an engine is running.
pub struct TaskCo {
    _private: (),
}

impl TaskCo {
    /// Suspends the task for `ms` milliseconds of engine time.
    pub fn sleep(&self, ms: u64) -> Sleep {
        sleep(ms)
    }

    /// Awaits another task through its handle.
    ///
    /// On first await the callee is bound to the current engine (if it
    /// has none yet) and scheduled to run; the calling frame is resumed
    /// once the callee completes. Awaiting an already-finished task
    /// produces its value without suspending.
    pub fn join<T: Clone + 'static>(&self, task: TaskHandle<T>) -> Join<T> {
        Join::new(task)
    }
}

/// Wrapper future bridging the task body to its promise: publishes the
/// result, captures panics, and wakes the registered continuations.
struct TaskFuture<T: 'static> {
    body: Pin<Box<dyn Future<Output = T>>>,
    promise: Rc<RefCell<TaskPromise<T>>>,
}

impl<T: 'static> TaskFuture<T> {
    /// Completes the promise and schedules every waiter at time 0, in
    /// registration order.
    fn finish(&self, result: Option<T>, error: Option<PanicPayload>) {
        let (waiters, engine) = {
            let mut promise = self.promise.borrow_mut();
            promise.result = result;
            promise.error = error;
            promise.done = true;
            (std::mem::take(&mut promise.on_finish), promise.engine.clone())
        };

        let engine = engine.and_then(|weak| weak.upgrade());
        match engine {
            Some(core) => {
                for handle in waiters {
                    core.schedule(handle, 0);
                }
            }
            // A task frame is only ever resumed by an engine, which binds
            // itself before scheduling; reaching this arm means the
            // invariant was broken.
            None => panic!("{}", Error::NoEngine),
        }
    }
}

impl<T: 'static> Future for TaskFuture<T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        match catch_unwind(AssertUnwindSafe(|| this.body.as_mut().poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(value)) => {
                this.finish(Some(value), None);
                Poll::Ready(())
            }
            Err(payload) => {
                log::debug!("task body panicked; completing exceptionally");
                this.finish(None, Some(payload));
                Poll::Ready(())
            }
        }
    }
}

/// Engine binding used by `Engine` methods; lives here so the engine can
/// bind without knowing the concrete result type.
pub(crate) fn bind_engine<T>(promise: &Rc<RefCell<TaskPromise<T>>>, core: &Rc<EngineCore>) {
    let mut promise = promise.borrow_mut();
    if promise.engine.is_none() {
        promise.engine = Some(Rc::downgrade(core));
    }
}
