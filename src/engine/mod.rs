//! Engine side of the boundary: the handle an engine keeps, and an optional
//! trait-driven service loop for engines that do not want to match on requests
//! themselves.
use crate::envelope::Request;
use crate::error::Rejection;
use crate::mailbox::MailboxReceiver;
use crate::shutdown::{ShutdownSignal, ShutdownTrigger};
use crate::types::{Hash, HashrateReport, Solution, WorkPackage};

/// The decisions only the proof-of-work engine can make.
pub trait RemoteEngine {
    /// The current work package, or why there is none.
    fn fetch_work(&mut self) -> Result<WorkPackage, Rejection>;

    /// Verify a sealed package. On success returns the hash of the resulting block.
    fn submit_work(&mut self, solution: &Solution) -> Result<Hash, Rejection>;

    /// Record a remote miner's self-reported rate.
    fn submit_hashrate(&mut self, report: &HashrateReport);
}

impl Request {
    /// Answer this request from `engine`, exactly once.
    pub fn dispatch<E: RemoteEngine + ?Sized>(self, engine: &mut E) {
        match self {
            Request::FetchWork(envelope) => envelope.respond(engine.fetch_work()),
            Request::SubmitWork(envelope) => {
                let result = engine.submit_work(&envelope.solution);
                envelope.respond(result);
            }
            Request::SubmitHashrate(envelope) => {
                engine.submit_hashrate(&envelope.report);
                envelope.acknowledge();
            }
        }
    }
}

/// What the engine holds: the mailbox intake and the right to shut the boundary down.
#[derive(Debug)]
pub struct EngineHandle {
    requests: MailboxReceiver,
    trigger: ShutdownTrigger,
    signal: ShutdownSignal,
}

impl EngineHandle {
    pub fn new(requests: MailboxReceiver, trigger: ShutdownTrigger) -> Self {
        let signal = trigger.signal();
        Self {
            requests,
            trigger,
            signal,
        }
    }

    pub fn requests(&self) -> &MailboxReceiver {
        &self.requests
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    /// Next request, blocking; `None` once every gateway is gone.
    pub fn next_request(&self) -> Option<Request> {
        self.requests.recv_or_shutdown(&self.signal)
    }

    /// Answer requests with `engine` until every gateway is dropped. Returns the number of
    /// requests served.
    pub fn serve<E: RemoteEngine + ?Sized>(&self, engine: &mut E) -> u64 {
        let mut served = 0u64;
        while let Some(request) = self.next_request() {
            tracing::debug!(
                kind = request.kind(),
                pending = self.requests.pending(),
                "serving remote request"
            );
            request.dispatch(engine);
            served += 1;
        }
        served
    }

    /// Stop the boundary: every pending and future gateway call unblocks. Requests still
    /// queued are dropped unanswered, closing their reply slots.
    pub fn shutdown(self) {
        let EngineHandle {
            requests, trigger, ..
        } = self;
        trigger.fire();
        drop(requests);
    }
}
