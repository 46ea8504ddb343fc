use crate::error::Error;
use crate::fiber::frame::PanicPayload;
use crate::generator::delegate::Fiber;

use std::cell::RefCell;
use std::rc::Rc;

/// Control state shared between a generator value, its yield handle and
/// its wrapper future.
///
/// The return slot is deliberately *not* part of this struct: it is the
/// only field whose type depends on the return parameter, and keeping it
/// in a separate cell lets one promise type serve the unit-return and
/// typed-return flavours alike.
pub(crate) struct GenPromise<Y: 'static> {
    /// Child fiber currently delegated to, if any.
    pub(crate) nested: Option<Rc<RefCell<dyn Fiber<Y>>>>,

    /// The most recent yielded value, taken by `next()`.
    pub(crate) yielded: Option<Y>,

    /// Panic captured from the body, rethrown by the next `next()`.
    pub(crate) error: Option<PanicPayload>,

    /// True once the body returned or panicked. Monotonic.
    pub(crate) done: bool,

    /// Set when a delegated child finished without yielding; tells
    /// `next()` to resume the outer frame again instead of reporting a
    /// yield.
    pub(crate) no_yield_finish: bool,
}

impl<Y: 'static> GenPromise<Y> {
    pub(crate) fn new() -> Self {
        Self {
            nested: None,
            yielded: None,
            error: None,
            done: false,
            no_yield_finish: false,
        }
    }

    /// Installs a child fiber to delegate to.
    ///
    /// A finished child may still be installed here: the body can reach
    /// its next delegation point without an intervening yield when the
    /// previous child produced no yields at all. Only an *unfinished*
    /// child makes a second chain an error.
    ///
    /// # Panics
    ///
    /// Panics with the [`Error::DoubleAwait`] message if an unfinished
    /// child is already installed.
    pub(crate) fn chain(&mut self, inner: Rc<RefCell<dyn Fiber<Y>>>) {
        if let Some(existing) = &self.nested {
            if !existing.borrow().is_done() {
                panic!("{}", Error::DoubleAwait);
            }
        }
        self.nested = Some(inner);
    }
}
