use crate::engine::context;
use crate::error::Error;
use crate::fiber::frame::{self, FrameHandle};
use crate::task::promise::TaskPromise;

use std::cell::RefCell;
use std::future::Future;
use std::panic::resume_unwind;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Non-owning reference to a task, used to await it from another task.
///
/// Handles are cheap to clone; several tasks may hold handles to the same
/// callee and each will be resumed when it completes. The handle does not
/// keep the task's frame alive — the [`Task`] value (or the engine, after
/// [`transfer_ownership`]) must outlive every pending await.
///
/// [`Task`]: crate::Task
/// [`transfer_ownership`]: crate::Engine::transfer_ownership
pub struct TaskHandle<T> {
    promise: Rc<RefCell<TaskPromise<T>>>,
    frame: FrameHandle,
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
            frame: self.frame.clone(),
        }
    }
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(promise: Rc<RefCell<TaskPromise<T>>>, frame: FrameHandle) -> Self {
        Self { promise, frame }
    }

    /// True once the task has completed.
    pub fn is_done(&self) -> bool {
        self.promise.borrow().done
    }
}

/// Future returned by [`TaskCo::join`]: resolves with the callee's value
/// once it completes.
///
/// [`TaskCo::join`]: crate::TaskCo::join
pub struct Join<T> {
    task: TaskHandle<T>,
    registered: bool,
}

impl<T> Join<T> {
    pub(crate) fn new(task: TaskHandle<T>) -> Self {
        task.promise.borrow_mut().co_awaited = true;
        Self {
            task,
            registered: false,
        }
    }
}

impl<T: Clone + 'static> Future for Join<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        let mut promise = this.task.promise.borrow_mut();

        if promise.done {
            if let Some(payload) = promise.error.take() {
                drop(promise);
                resume_unwind(payload);
            }
            return match promise.result.clone() {
                Some(value) => Poll::Ready(value),
                None => panic!("{}", Error::NoValueReturned),
            };
        }

        if !this.registered {
            this.registered = true;

            // Bind the callee to the ambient engine on first await, then
            // make sure it is queued to run on whichever engine holds it.
            if promise.engine.is_none() {
                let engine = match context::current() {
                    Some(engine) => engine,
                    None => panic!("{}", Error::NoEngine),
                };
                promise.engine = Some(Rc::downgrade(engine.core()));
            }
            let core = promise
                .engine
                .as_ref()
                .and_then(|weak| weak.upgrade())
                .unwrap_or_else(|| panic!("{}", Error::NoEngine));
            if !core.is_scheduled(&this.task.frame) {
                core.schedule(this.task.frame.clone(), 0);
            }

            // The calling frame resumes when the callee completes.
            let caller = frame::current()
                .expect("a task can only be awaited from inside an engine-driven frame");
            promise.on_finish.push(caller);
        }

        Poll::Pending
    }
}
