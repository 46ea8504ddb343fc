use crate::fiber::id;

use futures::future::LocalBoxFuture;
use futures::task::noop_waker;

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

/// Panic payload captured from a frame body, held until it can be
/// rethrown at the consumer-facing edge.
pub(crate) type PanicPayload = Box<dyn Any + Send + 'static>;

/// The storage cell behind one frame.
///
/// The future occupies the cell only while the frame is live: resuming
/// takes it out, polls it once, and puts it back on `Pending`. Once the
/// future completes it is dropped on the spot, so a finished frame holds
/// no state beyond its id and further resumes are no-ops.
struct FrameCell {
    /// Unique, monotonically increasing frame id (used in log output).
    id: u64,

    /// The suspended coroutine, absent once the frame has completed.
    future: RefCell<Option<LocalBoxFuture<'static, ()>>>,
}

thread_local! {
    /// Stack of frames currently being resumed on this thread.
    ///
    /// The top entry is the frame whose future is being polled right now;
    /// awaiters read it to learn which frame to register as the
    /// continuation of a suspension point.
    static ACTIVE: RefCell<Vec<FrameHandle>> = const { RefCell::new(Vec::new()) };
}

/// Owning side of a fiber frame.
///
/// Exactly one `FiberFrame` exists per generator or task; dropping it
/// destroys the suspended state. The engine and all awaiters only ever
/// hold non-owning [`FrameHandle`]s.
pub(crate) struct FiberFrame {
    cell: Rc<FrameCell>,
}

impl FiberFrame {
    /// Allocates a frame around `future`. The frame starts suspended:
    /// nothing runs until the first [`resume`](Self::resume).
    pub(crate) fn new(future: LocalBoxFuture<'static, ()>) -> Self {
        Self {
            cell: Rc::new(FrameCell {
                id: id::next_id(),
                future: RefCell::new(Some(future)),
            }),
        }
    }

    /// Returns a non-owning handle to this frame.
    pub(crate) fn handle(&self) -> FrameHandle {
        FrameHandle {
            cell: Rc::downgrade(&self.cell),
            id: self.cell.id,
        }
    }

    /// Advances the frame until its next suspension point or completion.
    ///
    /// Resuming a completed frame is a no-op.
    pub(crate) fn resume(&self) {
        resume_cell(&self.cell, self.handle());
    }
}

/// Non-owning reference to a fiber frame.
///
/// Handles are what the engine's event queue and the continuation lists
/// store. Two handles are considered the same frame when they point at
/// the same cell (address identity). A handle whose frame was dropped
/// resumes to a no-op.
#[derive(Clone)]
pub struct FrameHandle {
    cell: Weak<FrameCell>,
    id: u64,
}

impl FrameHandle {
    /// The frame's unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Address identity of the underlying frame.
    pub(crate) fn same_frame(&self, other: &FrameHandle) -> bool {
        self.cell.ptr_eq(&other.cell)
    }

    /// Resumes the frame once, if it is still alive.
    pub(crate) fn resume(&self) {
        match self.cell.upgrade() {
            Some(cell) => resume_cell(&cell, self.clone()),
            None => log::warn!("frame {} resumed after its owner was dropped", self.id),
        }
    }
}

impl std::fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHandle").field("id", &self.id).finish()
    }
}

/// The frame currently being resumed on this thread, if any.
pub(crate) fn current() -> Option<FrameHandle> {
    ACTIVE.with(|stack| stack.borrow().last().cloned())
}

fn resume_cell(cell: &Rc<FrameCell>, handle: FrameHandle) {
    let Some(mut future) = cell.future.borrow_mut().take() else {
        return;
    };

    ACTIVE.with(|stack| stack.borrow_mut().push(handle));
    let guard = PopGuard;

    let waker = noop_waker();
    let mut context = Context::from_waker(&waker);
    let poll = future.as_mut().poll(&mut context);

    drop(guard);

    if poll == Poll::Pending {
        *cell.future.borrow_mut() = Some(future);
    }
}

/// Pops the active-frame stack even if a poll unwinds.
struct PopGuard;

impl Drop for PopGuard {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
