//! Process-wide shutdown signal.
//!
//! Set from the Ctrl-C / SIGTERM handler, observed by the bot loop between
//! cycles and by the pump while it waits out an actuation. Waiting on the
//! signal is how every long sleep in the bot is made cancellable.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::app::ports::{CancellableDelay, DelayOutcome};

/// Cloneable handle; every clone observes the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every waiter.
    pub fn trigger(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for `timeout` or until shutdown is requested, whichever is
    /// first. Returns `true` if shutdown was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut triggered = flag.lock().unwrap_or_else(PoisonError::into_inner);
        // Loop guards against spurious wakeups.
        while !*triggered {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            triggered = cvar
                .wait_timeout(triggered, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *triggered
    }
}

impl CancellableDelay for ShutdownSignal {
    fn delay(&self, duration: Duration) -> DelayOutcome {
        if self.wait_timeout(duration) {
            DelayOutcome::Cancelled
        } else {
            DelayOutcome::Elapsed
        }
    }
}
