//! Engine shutdown broadcast.
//!
//! The signal is a flume channel that is never written to. The trigger owns the only
//! sender, so firing it (or dropping it) disconnects every observer at once, which a
//! `flume::Selector` sees as a ready receive.
use flume::{Receiver, Sender};

/// Create a trigger and its first observer.
pub fn shutdown() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = flume::bounded(0);
    let signal = ShutdownSignal { rx: rx.clone() };
    (ShutdownTrigger { _tx: tx, rx }, signal)
}

/// Engine-owned side of the broadcast. Not cloneable: exactly one owner decides when the
/// engine is gone.
#[derive(Debug)]
pub struct ShutdownTrigger {
    _tx: Sender<()>,
    rx: Receiver<()>,
}

impl ShutdownTrigger {
    /// Fire the broadcast. Irreversible.
    pub fn fire(self) {
        tracing::debug!("engine shutdown signalled");
    }

    /// A fresh observer of this trigger.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.rx.clone(),
        }
    }
}

/// Read-only view of the broadcast, cheap to clone and share across callers.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
}

impl ShutdownSignal {
    /// Non-blocking check.
    pub fn is_fired(&self) -> bool {
        self.rx.is_disconnected()
    }

    /// Block until the engine shuts down.
    pub fn wait(&self) {
        while self.rx.recv().is_ok() {}
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
