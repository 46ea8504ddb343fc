use crate::error::Error;
use crate::fiber::frame::FiberFrame;
use crate::generator::core::{drive, GenFuture};
use crate::generator::promise::GenPromise;

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// A bidirectional generator: the consumer feeds a value back in with
/// [`send`](Self::send), and the body receives it as the result of its
/// `yield_value(..).await`.
///
/// ```rust,ignore
/// let mut primes = SendGenerator::<u64, u64>::new(|co| async move {
///     let mut n = 10;
///     loop {
///         if is_prime(n) {
///             n = co.yield_value(n).await;
///         }
///         n += 1;
///     }
/// });
///
/// assert_eq!(primes.next(), Some(11));
/// assert_eq!(primes.send(100), Some(101));
/// ```
///
/// The send slot belongs to the generator value and is shared with the
/// body through the [`SendCo`] handle. Resuming a send point while the
/// slot is empty (a bare `next()` after the first) is a programming error
/// and panics.
///
/// Unlike [`Generator`], a send-generator cannot be delegated to from
/// another generator: the send channel is scoped to the owner driving it,
/// and [`Co::delegate_send`] refuses the attempt with a runtime error.
///
/// [`Generator`]: crate::Generator
/// [`Co::delegate_send`]: crate::Co::delegate_send
pub struct SendGenerator<Y: 'static, S, R = ()> {
    frame: FiberFrame,
    promise: Rc<RefCell<GenPromise<Y>>>,
    ret: Rc<RefCell<Option<R>>>,

    /// Value most recently fed in by `send`, consumed by the body.
    slot: Rc<RefCell<Option<S>>>,
}

impl<Y: 'static, S: 'static, R: 'static> SendGenerator<Y, S, R> {
    /// Creates a send-generator from its body factory.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: FnOnce(SendCo<Y, S>) -> Fut,
        Fut: Future<Output = R> + 'static,
    {
        let promise = Rc::new(RefCell::new(GenPromise::new()));
        let ret = Rc::new(RefCell::new(None));
        let slot = Rc::new(RefCell::new(None));

        let body = factory(SendCo {
            promise: promise.clone(),
            slot: slot.clone(),
        });

        let frame = FiberFrame::new(Box::pin(GenFuture {
            body: Box::pin(body),
            promise: promise.clone(),
            ret: ret.clone(),
        }));

        Self {
            frame,
            promise,
            ret,
            slot,
        }
    }

    /// Produces the next yielded value, or `None` once the body returned.
    ///
    /// # Panics
    ///
    /// Rethrows a panic raised by the body, including the empty-send-slot
    /// panic when a send point is resumed without a prior
    /// [`send`](Self::send).
    pub fn next(&mut self) -> Option<Y> {
        drive(&self.frame, &self.promise)
    }

    /// Feeds `value` to the suspended send point and resumes once.
    pub fn send(&mut self, value: S) -> Option<Y> {
        *self.slot.borrow_mut() = Some(value);
        self.next()
    }

    /// True once the body has returned (or panicked).
    pub fn is_done(&self) -> bool {
        self.promise.borrow().done
    }

    /// The body's return value.
    ///
    /// Fails with [`Error::NoValueReturned`] until the generator is done.
    pub fn result(&self) -> Result<R, Error>
    where
        R: Clone,
    {
        self.ret.borrow().clone().ok_or(Error::NoValueReturned)
    }
}

impl<Y: 'static, S: 'static, R: 'static> Iterator for SendGenerator<Y, S, R> {
    type Item = Y;

    fn next(&mut self) -> Option<Y> {
        SendGenerator::next(self)
    }
}

/// Yield handle passed to a send-generator body.
pub struct SendCo<Y: 'static, S> {
    promise: Rc<RefCell<GenPromise<Y>>>,
    slot: Rc<RefCell<Option<S>>>,
}

impl<Y: 'static, S> Clone for SendCo<Y, S> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
            slot: self.slot.clone(),
        }
    }
}

impl<Y: 'static, S: 'static> SendCo<Y, S> {
    /// Yields `value` and suspends; resuming produces the value the
    /// consumer passed to [`send`](SendGenerator::send).
    pub fn yield_value(&self, value: Y) -> SendYield<Y, S> {
        SendYield {
            promise: self.promise.clone(),
            slot: self.slot.clone(),
            value: Some(value),
            suspended: false,
        }
    }
}

/// Future returned by [`SendCo::yield_value`].
pub struct SendYield<Y: 'static, S> {
    promise: Rc<RefCell<GenPromise<Y>>>,
    slot: Rc<RefCell<Option<S>>>,
    value: Option<Y>,
    suspended: bool,
}

impl<Y: 'static, S> Unpin for SendYield<Y, S> {}

impl<Y: 'static, S> Future for SendYield<Y, S> {
    type Output = S;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<S> {
        let this = self.get_mut();
        if !this.suspended {
            this.suspended = true;
            this.promise.borrow_mut().yielded = this.value.take();
            return Poll::Pending;
        }
        match this.slot.borrow_mut().take() {
            Some(value) => Poll::Ready(value),
            None => panic!("{}", Error::NoValueReturned),
        }
    }
}
