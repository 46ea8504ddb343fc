//! One-shot asynchronous computations scheduled by an engine.
//!
//! A [`Task`] wraps a future that may suspend on timers
//! ([`TaskCo::sleep`]) and on other tasks ([`TaskCo::join`]). Tasks do not
//! run by themselves: an [`Engine`] resumes them when their deadline
//! elapses, and a completing task wakes every frame that awaited it.
//!
//! [`Engine`]: crate::Engine

pub(crate) mod core;
pub(crate) mod join;
pub(crate) mod promise;

pub use self::core::{Task, TaskCo};
pub use join::{Join, TaskHandle};
