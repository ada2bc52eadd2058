//! Request envelopes exchanged between the gateway and the engine.
//!
//! Every envelope owns its reply slots. The engine answers through a consuming method, so
//! an envelope is answered at most once; dropping it unanswered closes the slots.
use crate::error::Rejection;
use crate::reply::{reply, Replier, Reply};
use crate::types::{Hash, HashrateReport, Solution, WorkPackage};

/// A remote miner asks for the current work package.
#[derive(Debug)]
pub struct FetchWork {
    work: Replier<WorkPackage>,
    error: Replier<Rejection>,
}

pub(crate) struct FetchWorkReplies {
    pub work: Reply<WorkPackage>,
    pub error: Reply<Rejection>,
}

impl FetchWork {
    pub(crate) fn new() -> (Self, FetchWorkReplies) {
        let (work, work_rx) = reply();
        let (error, error_rx) = reply();
        (
            FetchWork { work, error },
            FetchWorkReplies {
                work: work_rx,
                error: error_rx,
            },
        )
    }

    pub fn respond(self, result: Result<WorkPackage, Rejection>) {
        let _ = match result {
            Ok(package) => self.work.send(package),
            Err(err) => self.error.send(err),
        };
    }
}

/// A remote miner submits a sealed work package.
#[derive(Debug)]
pub struct SubmitWork {
    pub solution: Solution,
    block_hash: Replier<Hash>,
    error: Replier<Rejection>,
}

pub(crate) struct SubmitWorkReplies {
    pub block_hash: Reply<Hash>,
    pub error: Reply<Rejection>,
}

impl SubmitWork {
    pub(crate) fn new(solution: Solution) -> (Self, SubmitWorkReplies) {
        let (block_hash, block_hash_rx) = reply();
        let (error, error_rx) = reply();
        (
            SubmitWork {
                solution,
                block_hash,
                error,
            },
            SubmitWorkReplies {
                block_hash: block_hash_rx,
                error: error_rx,
            },
        )
    }

    /// Accept with the hash of the sealed block, or reject with a reason.
    pub fn respond(self, result: Result<Hash, Rejection>) {
        let _ = match result {
            Ok(hash) => self.block_hash.send(hash),
            Err(err) => self.error.send(err),
        };
    }
}

/// A remote miner reports its hash rate.
#[derive(Debug)]
pub struct SubmitHashrate {
    pub report: HashrateReport,
    done: Replier<()>,
}

impl SubmitHashrate {
    pub(crate) fn new(report: HashrateReport) -> (Self, Reply<()>) {
        let (done, done_rx) = reply();
        (SubmitHashrate { report, done }, done_rx)
    }

    /// Confirm receipt of the report. Says nothing about its validity.
    pub fn acknowledge(self) {
        let _ = self.done.send(());
    }
}

/// Any request the engine may find in its mailbox.
#[derive(Debug)]
pub enum Request {
    FetchWork(FetchWork),
    SubmitWork(SubmitWork),
    SubmitHashrate(SubmitHashrate),
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::FetchWork(_) => "fetch_work",
            Request::SubmitWork(_) => "submit_work",
            Request::SubmitHashrate(_) => "submit_hashrate",
        }
    }
}
