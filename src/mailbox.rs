//! Engine intake for remote requests.
use crate::envelope::Request;
use crate::error::Error;
use crate::shutdown::ShutdownSignal;
use flume::{Receiver, Selector, Sender};

/// Create a mailbox. A capacity of zero makes every push a rendezvous with the engine.
pub fn mailbox(capacity: usize) -> (MailboxSender, MailboxReceiver) {
    let (tx, rx) = flume::bounded(capacity);
    (MailboxSender { tx }, MailboxReceiver { rx })
}

/// Gateway-side handle. Cloned into every gateway that talks to the same engine.
#[derive(Debug, Clone)]
pub struct MailboxSender {
    tx: Sender<Request>,
}

impl MailboxSender {
    /// Hand `request` to the engine, giving up as soon as the engine shuts down.
    ///
    /// A mailbox whose receiver is gone counts as stopped. On failure the request is
    /// dropped, closing its reply slots.
    pub(crate) fn push(&self, request: Request, shutdown: &ShutdownSignal) -> Result<(), Error> {
        if shutdown.is_fired() {
            return Err(Error::Stopped);
        }
        Selector::new()
            .send(&self.tx, request, |sent| sent.map_err(|_| Error::Stopped))
            .recv(shutdown.receiver(), |_| Err(Error::Stopped))
            .wait()
    }
}

/// Engine-side handle.
#[derive(Debug)]
pub struct MailboxReceiver {
    rx: Receiver<Request>,
}

impl MailboxReceiver {
    /// Block for the next request; `None` once every gateway is gone.
    pub fn recv(&self) -> Option<Request> {
        self.rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Request> {
        self.rx.try_recv().ok()
    }

    /// Block for the next request unless shutdown fires first.
    pub fn recv_or_shutdown(&self, shutdown: &ShutdownSignal) -> Option<Request> {
        if shutdown.is_fired() {
            return None;
        }
        Selector::new()
            .recv(&self.rx, |request| request.ok())
            .recv(shutdown.receiver(), |_| None)
            .wait()
    }

    /// Number of requests queued and not yet taken.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Drop for MailboxReceiver {
    /// Queued envelopes would otherwise outlive the engine for as long as any gateway
    /// holds a sender, leaving their callers waiting on slots nobody will close.
    fn drop(&mut self) {
        let dropped = self.rx.drain().count();
        if dropped > 0 {
            tracing::debug!(dropped, "dropped queued requests with the mailbox");
        }
    }
}
