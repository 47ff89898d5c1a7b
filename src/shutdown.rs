//! Cancellation for the simulation's timed loops.
//!
//! No value is ever sent on the channel: firing (or dropping) the trigger
//! disconnects it, which wakes every receiver at once.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Creates a connected trigger / signal pair.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = bounded(0);
    (ShutdownTrigger { _tx: tx }, Shutdown { rx })
}

/// Owner side. Firing consumes it; so does dropping it.
#[derive(Debug)]
pub struct ShutdownTrigger {
    _tx: Sender<()>,
}

impl ShutdownTrigger {
    pub fn fire(self) {}
}

/// Observer side, cloned into every unit.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: Receiver<()>,
}

impl Shutdown {
    /// Sleeps for up to `duration`. Returns `true` if the simulation is still
    /// running afterwards, `false` as soon as shutdown was requested.
    pub fn sleep(&self, duration: Duration) -> bool {
        matches!(self.rx.recv_timeout(duration), Err(RecvTimeoutError::Timeout))
    }

    pub fn is_triggered(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }
}
