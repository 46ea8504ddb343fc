use crate::error::Error;
use crate::generator::core::Generator;
use crate::generator::promise::GenPromise;

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Driving interface of a nested fiber, as seen from its parent.
///
/// Only [`Generator`] implements this. Delegating to a send-generator is
/// deliberately unsupported (the send channel is scoped to the producer's
/// owner); the explicit [`Co::delegate_send`] entry point refuses that
/// attempt at runtime.
///
/// [`Co::delegate_send`]: crate::Co::delegate_send
pub(crate) trait Fiber<Y> {
    fn is_done(&self) -> bool;
    fn next(&mut self) -> Option<Y>;
}

/// Future returned by [`Co::delegate`]: yield-from semantics.
///
/// While this future is pending, the outer generator's `next()` streams
/// the child's yields transparently; once the child finishes, awaiting
/// the future produces the child's return value.
///
/// [`Co::delegate`]: crate::Co::delegate
pub struct Delegate<Y: 'static, R> {
    outer: Rc<RefCell<GenPromise<Y>>>,
    inner: Rc<RefCell<Generator<Y, R>>>,
    chained: bool,
}

impl<Y: 'static, R> Delegate<Y, R> {
    pub(crate) fn new(outer: Rc<RefCell<GenPromise<Y>>>, inner: Generator<Y, R>) -> Self {
        Self {
            outer,
            inner: Rc::new(RefCell::new(inner)),
            chained: false,
        }
    }
}

impl<Y: 'static, R: 'static> Future for Delegate<Y, R> {
    type Output = R;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<R> {
        let this = self.get_mut();

        if !this.chained {
            this.chained = true;

            this.outer.borrow_mut().chain(this.inner.clone());

            // Drive one step of the child immediately: its first yield (or
            // the absence of one) becomes the outer generator's yield.
            let first = this.inner.borrow_mut().next();
            let child_done = this.inner.borrow().is_done();

            let mut outer = this.outer.borrow_mut();
            outer.yielded = first;
            if child_done {
                outer.no_yield_finish = true;
            }
            return Poll::Pending;
        }

        // The outer frame only resumes past this point once the child has
        // finished and been uninstalled.
        let mut inner = this.inner.borrow_mut();
        if !inner.is_done() {
            panic!("{}", Error::ResumeUnfinished);
        }
        match inner.take_result() {
            Some(value) => Poll::Ready(value),
            None => panic!("{}", Error::NoValueReturned),
        }
    }
}
