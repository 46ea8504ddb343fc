use crate::error::Error;
use crate::fiber::frame::FiberFrame;
use crate::generator::delegate::{Delegate, Fiber};
use crate::generator::promise::GenPromise;
use crate::generator::send::SendGenerator;

use std::cell::RefCell;
use std::future::Future;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// A lazy, restartable producer of `Y` values with an optional final
/// return value `R`.
///
/// A generator is created from a factory closure that receives a [`Co`]
/// handle and returns the async body:
///
/// ```rust,ignore
/// let mut g = Generator::<i32, f64>::new(|co| async move {
///     co.yield_value(3).await;
///     co.yield_value(4).await;
///     -1.0
/// });
///
/// assert_eq!(g.next(), Some(3));
/// assert_eq!(g.next(), Some(4));
/// assert_eq!(g.next(), None);
/// assert_eq!(g.result(), Ok(-1.0));
/// ```
///
/// Nothing runs until the first [`next`](Self::next): the frame starts
/// suspended. Once `next` returns `None` the generator is done and every
/// further call keeps returning `None`.
///
/// A panic inside the body is captured and rethrown from the `next` call
/// that observed it; the generator reports done afterwards.
pub struct Generator<Y: 'static, R = ()> {
    /// The owned frame backing the body.
    frame: FiberFrame,

    /// Control state shared with the [`Co`] handle and the wrapper future.
    promise: Rc<RefCell<GenPromise<Y>>>,

    /// Slot receiving the body's return value.
    ret: Rc<RefCell<Option<R>>>,
}

impl<Y: 'static, R: 'static> Generator<Y, R> {
    /// Creates a generator from its body factory.
    ///
    /// The factory runs immediately; the body it returns does not.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: FnOnce(Co<Y>) -> Fut,
        Fut: Future<Output = R> + 'static,
    {
        let promise = Rc::new(RefCell::new(GenPromise::new()));
        let ret = Rc::new(RefCell::new(None));

        let body = factory(Co {
            promise: promise.clone(),
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
        }
    }

    /// Produces the next yielded value, or `None` once the body returned.
    ///
    /// If a child generator is currently delegated to, its yields are
    /// streamed through transparently; when the child finishes it is
    /// uninstalled and the outer body resumes in the same call.
    ///
    /// # Panics
    ///
    /// Rethrows a panic raised by the generator body.
    pub fn next(&mut self) -> Option<Y> {
        // Delegate to an installed child first. A child observed done
        // (up front, or by yielding nothing) is uninstalled before the
        // outer frame resumes.
        let nested = self.promise.borrow().nested.clone();
        if let Some(child) = nested {
            let child_done = child.borrow().is_done();
            if !child_done {
                if let Some(value) = child.borrow_mut().next() {
                    return Some(value);
                }
            }
            self.promise.borrow_mut().nested = None;
        }

        // Resume the own frame until it yields, returns, or installs a
        // child that finished without yielding (in which case one more
        // resume is needed to run the body past the delegation point).
        drive(&self.frame, &self.promise)
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

    /// Moves the return value out of the slot (delegation resume path).
    pub(crate) fn take_result(&mut self) -> Option<R> {
        self.ret.borrow_mut().take()
    }
}

impl<Y: 'static, R: 'static> Fiber<Y> for Generator<Y, R> {
    fn is_done(&self) -> bool {
        Generator::is_done(self)
    }

    fn next(&mut self) -> Option<Y> {
        Generator::next(self)
    }
}

impl<Y: 'static, R: 'static> Iterator for Generator<Y, R> {
    type Item = Y;

    fn next(&mut self) -> Option<Y> {
        Generator::next(self)
    }
}

/// Yield handle passed to a generator body.
///
/// The handle is the body's only way to talk to its consumer: it records
/// yielded values and installs delegated children. It is cheap to clone.
pub struct Co<Y: 'static> {
    pub(crate) promise: Rc<RefCell<GenPromise<Y>>>,
}

impl<Y: 'static> Clone for Co<Y> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<Y: 'static> Co<Y> {
    /// Yields `value` to the consumer and suspends until the next
    /// [`next`](Generator::next) call.
    pub fn yield_value(&self, value: Y) -> Yield<Y> {
        Yield {
            promise: self.promise.clone(),
            value: Some(value),
            suspended: false,
        }
    }

    /// Delegates to `inner` (yield-from): the child's yields surface
    /// through this generator's `next()` until the child finishes, and
    /// awaiting the returned future produces the child's return value.
    ///
    /// # Panics
    ///
    /// Awaiting the future panics with the [`Error::DoubleAwait`] message
    /// if another child is still running.
    pub fn delegate<R2: 'static>(&self, inner: Generator<Y, R2>) -> Delegate<Y, R2> {
        Delegate::new(self.promise.clone(), inner)
    }

    /// Delegating to a send-generator is deliberately refused: the send
    /// channel is scoped to the owner driving the generator, so its
    /// yields cannot stream through a parent.
    ///
    /// # Panics
    ///
    /// Always panics with the [`Error::NotImplemented`] message.
    pub fn delegate_send<S: 'static, R2: 'static>(
        &self,
        _inner: SendGenerator<Y, S, R2>,
    ) -> Delegate<Y, R2> {
        panic!("{}", Error::NotImplemented("awaiting a send-generator"))
    }
}

/// Future returned by [`Co::yield_value`]: records the value and suspends
/// exactly once.
pub struct Yield<Y: 'static> {
    promise: Rc<RefCell<GenPromise<Y>>>,
    value: Option<Y>,
    suspended: bool,
}

impl<Y: 'static> Unpin for Yield<Y> {}

impl<Y: 'static> Future for Yield<Y> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if !this.suspended {
            this.suspended = true;
            this.promise.borrow_mut().yielded = this.value.take();
            Poll::Pending
        } else {
            Poll::Ready(())
        }
    }
}

/// Resume loop shared by plain and send generators: advances the frame
/// until it yields, returns, or needs another resume after a child
/// finished without yielding.
pub(crate) fn drive<Y: 'static>(frame: &FiberFrame, promise: &Rc<RefCell<GenPromise<Y>>>) -> Option<Y> {
    loop {
        promise.borrow_mut().no_yield_finish = false;
        frame.resume();

        let mut state = promise.borrow_mut();
        if let Some(payload) = state.error.take() {
            drop(state);
            resume_unwind(payload);
        }
        if state.done {
            return None;
        }
        if state.no_yield_finish {
            continue;
        }
        return state.yielded.take();
    }
}

/// Wrapper future bridging the body to the promise: publishes the return
/// value, marks completion, and captures panics.
pub(crate) struct GenFuture<Y: 'static, R: 'static> {
    pub(crate) body: Pin<Box<dyn Future<Output = R>>>,
    pub(crate) promise: Rc<RefCell<GenPromise<Y>>>,
    pub(crate) ret: Rc<RefCell<Option<R>>>,
}

impl<Y: 'static, R: 'static> Future for GenFuture<Y, R> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        match catch_unwind(AssertUnwindSafe(|| this.body.as_mut().poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(value)) => {
                *this.ret.borrow_mut() = Some(value);
                this.promise.borrow_mut().done = true;
                Poll::Ready(())
            }
            Err(payload) => {
                let mut promise = this.promise.borrow_mut();
                promise.error = Some(payload);
                promise.done = true;
                Poll::Ready(())
            }
        }
    }
}
