//! Single-use reply slots connecting one request to one answer.
use flume::{Receiver, Sender};

/// Create a connected one-shot pair.
pub fn reply<T>() -> (Replier<T>, Reply<T>) {
    let (tx, rx) = flume::bounded(1);
    (Replier { tx }, Reply { rx })
}

/// Write half of a one-shot slot. Sending consumes it, so it can be written at most once;
/// dropping it unwritten closes the slot without a value.
#[derive(Debug)]
pub struct Replier<T> {
    tx: Sender<T>,
}

impl<T> Replier<T> {
    /// Deliver the value. Returns `false` if the waiting side has already gone away.
    pub fn send(self, value: T) -> bool {
        self.tx.try_send(value).is_ok()
    }
}

/// Read half of a one-shot slot.
#[derive(Debug)]
pub struct Reply<T> {
    rx: Receiver<T>,
}

impl<T> Reply<T> {
    /// Block until the value arrives; `None` if the slot was closed without one.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Non-blocking probe.
    pub fn try_take(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub(crate) fn receiver(&self) -> &Receiver<T> {
        &self.rx
    }
}
