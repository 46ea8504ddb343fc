use crate::engine::context;
use crate::engine::core::EngineCore;
use crate::error::Error;
use crate::fiber::frame;

use std::future::Future;
use std::pin::Pin;
use std::rc::Weak;
use std::task::{Context, Poll};

/// Suspends the current frame for `ms` milliseconds of engine time.
///
/// The deadline is measured against the ambient engine's clock at the
/// first poll. Must be awaited from inside an engine-driven frame.
pub fn sleep(ms: u64) -> Sleep {
    Sleep {
        duration: ms,
        deadline: None,
        engine: None,
        registered: false,
    }
}

/// Future returned by [`sleep`] and [`Engine::sleep`].
///
/// Its first poll schedules the calling frame at the deadline and
/// suspends; the engine resumes the frame no earlier than that deadline.
///
/// [`Engine::sleep`]: crate::Engine::sleep
pub struct Sleep {
    /// Requested duration, used when no deadline was fixed at creation.
    duration: u64,

    /// Absolute wake time; `None` until resolved.
    deadline: Option<u64>,

    /// Engine chosen at creation ([`Engine::sleep`]); the ambient engine
    /// otherwise.
    ///
    /// [`Engine::sleep`]: crate::Engine::sleep
    engine: Option<Weak<EngineCore>>,

    registered: bool,
}

impl Sleep {
    pub(crate) fn with_engine(core: Weak<EngineCore>, deadline: u64) -> Self {
        Self {
            duration: 0,
            deadline: Some(deadline),
            engine: Some(core),
            registered: false,
        }
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if this.registered {
            return Poll::Ready(());
        }
        this.registered = true;

        let core = match &this.engine {
            Some(weak) => weak.upgrade(),
            None => context::current().map(|engine| engine.core().clone()),
        };
        let core = core.unwrap_or_else(|| panic!("{}", Error::NoEngine));

        let deadline = this
            .deadline
            .unwrap_or_else(|| core.now().saturating_add(this.duration));

        let caller =
            frame::current().expect("sleep must be awaited from inside an engine-driven frame");
        core.schedule(caller, deadline);

        Poll::Pending
    }
}
