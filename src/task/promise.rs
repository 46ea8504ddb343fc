use crate::engine::core::EngineCore;
use crate::fiber::frame::{FrameHandle, PanicPayload};

use std::rc::Weak;

/// Per-task state shared between the task value, its handles, its wrapper
/// future and the engine.
pub(crate) struct TaskPromise<T> {
    /// The task's return value; `Some` once the body returned normally.
    pub(crate) result: Option<T>,

    /// Panic captured from the body; surfaced at the awaiting frame.
    pub(crate) error: Option<PanicPayload>,

    /// True once the body returned or panicked. Monotonic.
    pub(crate) done: bool,

    /// Frames to wake when this task completes, in registration order.
    pub(crate) on_finish: Vec<FrameHandle>,

    /// Engine this task is bound to; set by `schedule_task`,
    /// `set_engine`, `transfer_ownership`, or the first await.
    pub(crate) engine: Option<Weak<EngineCore>>,

    /// True once the task has been awaited at least once. Only read by
    /// the destructor's hanging-task check.
    pub(crate) co_awaited: bool,
}

impl<T> TaskPromise<T> {
    pub(crate) fn new() -> Self {
        Self {
            result: None,
            error: None,
            done: false,
            on_finish: Vec::new(),
            engine: None,
            co_awaited: false,
        }
    }
}
