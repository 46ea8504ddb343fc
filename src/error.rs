/// Errors surfaced by generators, tasks and the engine.
///
/// The crate distinguishes *misuse* errors (raised synchronously at the
/// call that commits them), the *environment* error [`NoEngine`], and
/// panics propagated out of user code running inside a frame. Value
/// queries such as [`Generator::result`] return `Result<_, Error>`;
/// structural misuse fails fast with a panic carrying the same message
/// (see the crate docs for the exact policy per operation).
///
/// [`NoEngine`]: Error::NoEngine
/// [`Generator::result`]: crate::Generator::result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A frame awaits a second child before the first has finished.
    #[error("a promise awaits on a second one before the first has finished")]
    DoubleAwait,

    /// A result was read from a frame that has not finished yet.
    #[error("await_resume() is called on an unfinished generator/coroutine")]
    ResumeUnfinished,

    /// A finished frame was asked for a value it never produced.
    #[error("a generator/coroutine with return type returns no value")]
    NoValueReturned,

    /// A task needed an engine but no engine is installed on the thread.
    #[error("a coroutine is scheduled on a thread without any engine")]
    NoEngine,

    /// A task was dropped without ever being awaited or handed to an engine.
    #[error("a task is created but neither awaited nor scheduled")]
    HangingTask,

    /// Raised by API surfaces the library deliberately leaves
    /// unimplemented, such as delegating to a send-generator
    /// ([`Co::delegate_send`]).
    ///
    /// [`Co::delegate_send`]: crate::Co::delegate_send
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}
