//! Thread-local engine context.
//!
//! While an engine is running it installs itself into a per-thread slot;
//! awaiters polled inside its frames use [`current`] to discover the
//! ambient engine (for implicit task binding and timed wake-ups). The
//! slot is restored on exit, and re-entering [`Engine::run`] from inside
//! a driven frame is rejected.
//!
//! [`Engine::run`]: crate::Engine::run

use crate::engine::Engine;

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// The engine currently driving frames on this thread.
    static CURRENT_ENGINE: RefCell<Option<Engine>> = const { RefCell::new(None) };
}

/// The ambient engine, if one is running on this thread.
pub(crate) fn current() -> Option<Engine> {
    CURRENT_ENGINE.with(|slot| slot.borrow().clone())
}

/// Guard returned by the enter functions; uninstalls the engine on drop.
pub(crate) struct ContextGuard {
    installed: bool,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if self.installed {
            CURRENT_ENGINE.with(|slot| {
                *slot.borrow_mut() = None;
            });
        }
    }
}

/// Installs `engine` for the duration of a full `run`.
///
/// # Panics
///
/// Panics if any engine is already installed on this thread — including
/// `engine` itself, which would mean a re-entrant `run`.
pub(crate) fn enter_run(engine: &Engine) -> ContextGuard {
    CURRENT_ENGINE.with(|slot| {
        let mut slot = slot.borrow_mut();
        assert!(
            slot.is_none(),
            "Engine::run is not re-entrant: an engine is already running on this thread"
        );
        *slot = Some(engine.clone());
        ContextGuard { installed: true }
    })
}

/// Installs `engine` for a single round, tolerating the case where it is
/// already the ambient engine (a round inside its own `run`).
///
/// # Panics
///
/// Panics if a *different* engine is installed on this thread.
pub(crate) fn enter_round(engine: &Engine) -> ContextGuard {
    CURRENT_ENGINE.with(|slot| {
        let mut slot = slot.borrow_mut();
        match &*slot {
            Some(current) if Rc::ptr_eq(current.core(), engine.core()) => {
                ContextGuard { installed: false }
            }
            Some(_) => panic!("another engine is already running on this thread"),
            None => {
                *slot = Some(engine.clone());
                ContextGuard { installed: true }
            }
        }
    })
}
