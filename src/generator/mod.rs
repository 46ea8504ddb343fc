//! Restartable producers of yielded values.
//!
//! A [`Generator`] is created from an async factory closure and driven by
//! [`next`](Generator::next): each call resumes the underlying frame until
//! the body yields, delegates, or returns. The module provides:
//! - plain and typed-return generators ([`Generator`]),
//! - bidirectional generators ([`SendGenerator`]) with Python-style `send`,
//! - transparent nesting (yield-from) via [`Co::delegate`].

pub(crate) mod core;
pub(crate) mod delegate;
pub(crate) mod promise;
pub(crate) mod send;

pub use self::core::{Co, Generator, Yield};
pub use delegate::Delegate;
pub use send::{SendCo, SendGenerator, SendYield};
