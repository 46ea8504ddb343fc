//! # Filum
//!
//! **Filum** is a small asynchronous-execution library built on stackless
//! coroutines: lazy [`Generator`]s with Python-style `send` and
//! transparent nesting, one-shot [`Task`]s, and a single-threaded
//! cooperative [`Engine`] that drives tasks against a logical clock.
//!
//! The three abstractions cooperate through a thin continuation layer:
//!
//! - A **generator** is pulled by [`next`](Generator::next); a generator
//!   awaited inside another generator streams its yields through the
//!   outer one (yield-from) and hands back its return value.
//! - A **task** is resumed only by its engine; awaiting another task
//!   schedules it on first await and resumes the caller when it
//!   completes.
//! - The **engine** sleeps until the next timed event, resumes every due
//!   frame in insertion order, and never resumes a frame twice.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use filum::{Engine, Generator, Task};
//!
//! // A generator that yields twice and returns a value.
//! let mut g = Generator::<i32, f64>::new(|co| async move {
//!     co.yield_value(3).await;
//!     co.yield_value(4).await;
//!     -1.0
//! });
//! assert_eq!(g.next(), Some(3));
//!
//! // A task that sleeps on the engine's clock.
//! let engine = Engine::new();
//! let task = Task::new(|co| async move {
//!     co.sleep(1000).await;
//! });
//! engine.schedule_task(&task, 0);
//! engine.run();
//! ```
//!
//! ## Error policy
//!
//! Value queries return `Result<_, Error>`; structural misuse (double
//! delegation, reading an empty send slot, dropping an unobserved task)
//! fails fast with a panic carrying the matching [`Error`] message.
//! Panics raised by user code inside a frame are captured and rethrown at
//! the consumer-facing edge: the `next()` call for generators, the
//! awaiting task for tasks.
//!
//! Everything here is single-threaded and cooperative; none of the types
//! are `Send`.

mod engine;
mod error;
mod fiber;
mod generator;
mod task;
mod timer;

pub use engine::{sleep, Engine, Sleep};
pub use error::Error;
pub use fiber::FrameHandle;
pub use generator::{Co, Delegate, Generator, SendCo, SendGenerator, SendYield, Yield};
pub use task::{Join, Task, TaskCo, TaskHandle};
pub use timer::{SystemTimer, Timer, VirtualTimer};
