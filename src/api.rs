//! Operations exposed to remote miners.
//!
//! Each call runs on the caller's thread, hands one envelope to the engine's mailbox and
//! waits for the answer. Both suspensions race the engine's shutdown signal, except the
//! wait for a hash-rate acknowledgement.
use crate::config::SealerConfig;
use crate::engine::EngineHandle;
use crate::envelope::{FetchWork, Request, SubmitHashrate, SubmitWork};
use crate::error::{CannotSubmitWork, Error, Rejection};
use crate::hashrate::HashrateSource;
use crate::mailbox::{mailbox, MailboxSender};
use crate::mode::PowMode;
use crate::reply::Reply;
use crate::shutdown::{shutdown, ShutdownSignal};
use crate::types::{BlockNonce, Hash, HashrateReport, HexU64, Solution, WorkPackage};
use derive_builder::Builder;
use flume::Selector;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Builder, Clone)]
#[builder(pattern = "owned")]
pub struct SealerApi {
    #[builder(default)]
    mode: PowMode,
    mailbox: MailboxSender,
    shutdown: ShutdownSignal,
    hashrate: Arc<dyn HashrateSource>,
}

impl Debug for SealerApi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealerApi")
            .field("mode", &self.mode)
            .field("stopped", &self.shutdown.is_fired())
            .finish_non_exhaustive()
    }
}

impl SealerApiBuilder {
    fn validate(&self) -> Result<(), Error> {
        if self.mailbox.is_none() {
            return Err(Error::InvalidConfig("mailbox must be provided".into()));
        }
        if self.shutdown.is_none() {
            return Err(Error::InvalidConfig("shutdown signal must be provided".into()));
        }
        if self.hashrate.is_none() {
            return Err(Error::InvalidConfig("hashrate source must be provided".into()));
        }
        Ok(())
    }

    pub fn build_validated(self) -> Result<SealerApi, Error> {
        self.validate()?;
        self.build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Wire a gateway to a fresh mailbox and shutdown signal. The engine keeps the returned
/// handle; dropping it stops the boundary.
pub fn remote_sealer(
    config: &SealerConfig,
    hashrate: Arc<dyn HashrateSource>,
) -> Result<(SealerApi, EngineHandle), Error> {
    config.validate()?;
    let (tx, rx) = mailbox(config.mailbox_capacity);
    let (trigger, signal) = shutdown();
    let api = SealerApiBuilder::default()
        .mode(config.pow_mode)
        .mailbox(tx)
        .shutdown(signal)
        .hashrate(hashrate)
        .build_validated()?;
    Ok((api, EngineHandle::new(rx, trigger)))
}

/// How an engine settled a two-slot exchange.
enum Answer<T> {
    Value(T),
    Rejected(Rejection),
    Stopped,
}

fn delivered<T>(value: &Reply<T>, error: &Reply<Rejection>) -> Option<Answer<T>> {
    value
        .try_take()
        .map(Answer::Value)
        .or_else(|| error.try_take().map(Answer::Rejected))
}

impl SealerApi {
    pub fn mode(&self) -> PowMode {
        self.mode
    }

    fn ensure_remote(&self, call: &'static str) -> Result<(), Error> {
        if self.mode.supports_remote() {
            return Ok(());
        }
        warn!(call, mode = %self.mode, "remote call refused in this mode");
        Err(Error::NotSupported)
    }

    fn push(&self, request: Request) -> Result<(), Error> {
        let kind = request.kind();
        debug!(kind, "pushing request to engine");
        self.mailbox.push(request, &self.shutdown).map_err(|err| {
            warn!(kind, "engine stopped before accepting request");
            err
        })
    }

    /// Wait for whichever slot the engine fills, or for shutdown.
    ///
    /// A slot closing without a value settles nothing by itself: the engine fills one slot
    /// before releasing both, so the other slot is re-checked. An answer already delivered
    /// wins over a concurrent shutdown.
    fn await_answer<T>(&self, value: &Reply<T>, error: &Reply<Rejection>) -> Answer<T> {
        if let Some(answer) = delivered(value, error) {
            return answer;
        }
        let selected = Selector::new()
            .recv(value.receiver(), |v| v.ok().map(Answer::Value))
            .recv(error.receiver(), |e| e.ok().map(Answer::Rejected))
            .recv(self.shutdown.receiver(), |_| None)
            .wait();
        selected
            .or_else(|| delivered(value, error))
            .unwrap_or(Answer::Stopped)
    }

    /// Current work package for a remote miner.
    pub fn get_work(&self) -> Result<WorkPackage, Error> {
        self.ensure_remote("get_work")?;
        let (envelope, replies) = FetchWork::new();
        self.push(Request::FetchWork(envelope))?;
        match self.await_answer(&replies.work, &replies.error) {
            Answer::Value(work) => Ok(work),
            Answer::Rejected(reason) => {
                debug!(%reason, "engine has no work for remote miner");
                Err(Error::Engine(reason.message().to_owned()))
            }
            Answer::Stopped => Err(Error::Stopped),
        }
    }

    fn seal(&self, solution: Solution) -> Result<Hash, Error> {
        self.ensure_remote("submit_work")?;
        let (envelope, replies) = SubmitWork::new(solution);
        self.push(Request::SubmitWork(envelope))?;
        match self.await_answer(&replies.block_hash, &replies.error) {
            Answer::Value(block_hash) => {
                debug!(pow_hash = %solution.pow_hash, %block_hash, "remote seal accepted");
                Ok(block_hash)
            }
            Answer::Rejected(reason) => {
                debug!(pow_hash = %solution.pow_hash, %reason, "remote seal rejected");
                Err(Error::Engine(reason.message().to_owned()))
            }
            Answer::Stopped => Err(Error::Stopped),
        }
    }

    /// Submit a sealed package. Invalid, stale and unknown work all yield `false`, as does
    /// a stopped engine.
    pub fn submit_work(&self, nonce: BlockNonce, pow_hash: Hash, mix_digest: Hash) -> bool {
        self.seal(Solution {
            nonce,
            pow_hash,
            mix_digest,
        })
        .is_ok()
    }

    /// Like [`submit_work`](Self::submit_work), but returns the sealed block's hash and,
    /// on failure, the reason as error data.
    pub fn submit_work_detail(
        &self,
        nonce: BlockNonce,
        pow_hash: Hash,
        mix_digest: Hash,
    ) -> Result<Hash, CannotSubmitWork> {
        self.seal(Solution {
            nonce,
            pow_hash,
            mix_digest,
        })
        .map_err(|err| CannotSubmitWork::new(err.to_string()))
    }

    /// Report a remote miner's hash rate. `id` must be unique across miners.
    ///
    /// Once the engine has taken the report this waits for its acknowledgement even if the
    /// engine shuts down meanwhile.
    pub fn submit_hash_rate(&self, rate: HexU64, id: Hash) -> bool {
        if self.ensure_remote("submit_hash_rate").is_err() {
            return false;
        }
        let (envelope, done) = SubmitHashrate::new(HashrateReport { id, rate });
        if self.push(Request::SubmitHashrate(envelope)).is_err() {
            return false;
        }
        // Closed without acknowledgement still ends the wait; the report was accepted.
        done.wait();
        true
    }

    /// Combined hash rate of local and remote miners.
    pub fn get_hashrate(&self) -> u64 {
        self.hashrate.hashrate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SealerConfig;
    use crate::engine::RemoteEngine;
    use crate::error::{CANNOT_SUBMIT_WORK_CODE, STOPPED_MESSAGE};
    use crate::hashrate::FixedHashrate;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;
    use std::time::Duration;

    fn package() -> WorkPackage {
        WorkPackage {
            pow_hash: Hash([0xaa; 32]),
            seed_hash: Hash([0xbb; 32]),
            target: Hash([0x0f; 32]),
            number: 12,
            parent_hash: Hash([0xcc; 32]),
            gas_limit: 30_000_000,
            gas_used: 21_000,
            tx_count: 1,
            uncle_count: 0,
        }
    }

    fn sealer(mode: PowMode) -> (SealerApi, EngineHandle) {
        let config = SealerConfig {
            pow_mode: mode,
            ..SealerConfig::default()
        };
        remote_sealer(&config, Arc::new(FixedHashrate(500))).expect("sealer")
    }

    /// Accepts seals whose nonce is odd and has work once `has_work` is set.
    struct ToyEngine {
        has_work: bool,
        rates: Arc<AtomicU64>,
    }

    impl RemoteEngine for ToyEngine {
        fn fetch_work(&mut self) -> Result<WorkPackage, Rejection> {
            if self.has_work {
                Ok(package())
            } else {
                Err(Rejection::no_work())
            }
        }

        fn submit_work(&mut self, solution: &Solution) -> Result<Hash, Rejection> {
            if solution.nonce.to_u64() % 2 == 1 {
                Ok(Hash([0x77; 32]))
            } else {
                Err(Rejection::invalid_seal())
            }
        }

        fn submit_hashrate(&mut self, report: &HashrateReport) {
            self.rates.fetch_add(report.rate.0, Ordering::SeqCst);
        }
    }

    fn spawn_engine(
        handle: EngineHandle,
        has_work: bool,
    ) -> (thread::JoinHandle<u64>, Arc<AtomicU64>) {
        let rates = Arc::new(AtomicU64::new(0));
        let mut engine = ToyEngine {
            has_work,
            rates: rates.clone(),
        };
        (thread::spawn(move || handle.serve(&mut engine)), rates)
    }

    fn nonce(n: u64) -> BlockNonce {
        BlockNonce::from_u64(n)
    }

    #[test]
    fn unsupported_modes_fail_without_touching_mailbox() {
        for mode in [PowMode::Shared, PowMode::Fake, PowMode::FullFake] {
            let (api, handle) = sealer(mode);
            assert_eq!(api.get_work(), Err(Error::NotSupported));
            assert!(!api.submit_work(nonce(1), Hash([1; 32]), Hash([2; 32])));
            let err = api
                .submit_work_detail(nonce(1), Hash([1; 32]), Hash([2; 32]))
                .unwrap_err();
            assert_eq!(err.reason(), "not supported");
            assert!(!api.submit_hash_rate(HexU64(10), Hash([3; 32])));
            assert_eq!(api.get_hashrate(), 500);
            assert!(handle.requests().try_recv().is_none());
        }
    }

    #[test]
    fn get_work_returns_full_package() {
        let (api, handle) = sealer(PowMode::Test);
        let (engine, _) = spawn_engine(handle, true);

        let work = api.get_work().expect("work");
        assert_eq!(work, package());
        let wire = work.to_wire();
        assert_eq!(wire.len(), 9);
        assert!(wire.iter().all(|field| field.starts_with("0x")));

        drop(api);
        assert_eq!(engine.join().unwrap(), 1);
    }

    #[test]
    fn get_work_surfaces_engine_error() {
        let (api, handle) = sealer(PowMode::Normal);
        let (engine, _) = spawn_engine(handle, false);

        assert_eq!(
            api.get_work(),
            Err(Error::Engine("no mining work available yet".into()))
        );
        drop(api);
        engine.join().unwrap();
    }

    #[test]
    fn submit_work_maps_answers_to_bool() {
        let (api, handle) = sealer(PowMode::Normal);
        let (engine, _) = spawn_engine(handle, true);

        assert!(api.submit_work(nonce(3), Hash([1; 32]), Hash([2; 32])));
        assert!(!api.submit_work(nonce(4), Hash([1; 32]), Hash([2; 32])));

        drop(api);
        assert_eq!(engine.join().unwrap(), 2);
    }

    #[test]
    fn submit_work_ignores_rejection_content() {
        let (api, handle) = sealer(PowMode::Normal);
        let engine = thread::spawn(move || {
            for reason in ["stale work", "unknown work", ""] {
                match handle.next_request() {
                    Some(Request::SubmitWork(envelope)) => {
                        envelope.respond(Err(Rejection::new(reason)))
                    }
                    other => panic!("unexpected request {other:?}"),
                }
            }
        });
        for _ in 0..3 {
            assert!(!api.submit_work(nonce(1), Hash([1; 32]), Hash([2; 32])));
        }
        engine.join().unwrap();
    }

    #[test]
    fn submit_work_detail_reports_reason() {
        let (api, handle) = sealer(PowMode::Normal);
        let (engine, _) = spawn_engine(handle, true);

        let block = api
            .submit_work_detail(nonce(5), Hash([1; 32]), Hash([2; 32]))
            .expect("accepted");
        assert_eq!(block, Hash([0x77; 32]));

        let err = api
            .submit_work_detail(nonce(6), Hash([1; 32]), Hash([2; 32]))
            .unwrap_err();
        assert_eq!(err.code(), CANNOT_SUBMIT_WORK_CODE);
        assert_eq!(err.to_string(), "Cannot submit work.");
        assert_eq!(err.reason(), "invalid or stale proof-of-work solution");

        drop(api);
        engine.join().unwrap();
    }

    #[test]
    fn shutdown_before_push() {
        let (api, handle) = sealer(PowMode::Normal);
        handle.shutdown();

        assert_eq!(api.get_work(), Err(Error::Stopped));
        assert!(!api.submit_work(nonce(1), Hash([1; 32]), Hash([2; 32])));
        let err = api
            .submit_work_detail(nonce(1), Hash([1; 32]), Hash([2; 32]))
            .unwrap_err();
        assert_eq!(err.reason(), STOPPED_MESSAGE);
        assert!(!api.submit_hash_rate(HexU64(1), Hash([1; 32])));
    }

    #[test]
    fn shutdown_while_waiting_for_answer() {
        let (api, handle) = sealer(PowMode::Normal);
        let caller = thread::spawn(move || api.get_work());

        let held = handle.next_request().expect("request");
        let signal = handle.signal();
        handle.shutdown();
        assert!(signal.is_fired());

        assert_eq!(caller.join().unwrap(), Err(Error::Stopped));
        drop(held);
    }

    #[test]
    fn dropped_envelope_counts_as_stopped() {
        let (api, handle) = sealer(PowMode::Normal);
        let engine = thread::spawn(move || {
            let request = handle.next_request().expect("request");
            drop(request);
            handle
        });
        let err = api
            .submit_work_detail(nonce(1), Hash([1; 32]), Hash([2; 32]))
            .unwrap_err();
        assert_eq!(err.reason(), STOPPED_MESSAGE);
        engine.join().unwrap();
    }

    #[test]
    fn hash_rate_is_acknowledged() {
        let (api, handle) = sealer(PowMode::Normal);
        let (engine, rates) = spawn_engine(handle, true);

        assert!(api.submit_hash_rate(HexU64(150), Hash::random()));
        assert!(api.submit_hash_rate(HexU64(50), Hash::random()));
        assert_eq!(rates.load(Ordering::SeqCst), 200);

        drop(api);
        engine.join().unwrap();
    }

    #[test]
    fn hash_rate_wait_survives_shutdown() {
        let (api, handle) = sealer(PowMode::Normal);
        let caller = thread::spawn(move || api.submit_hash_rate(HexU64(10), Hash([9; 32])));

        let request = handle.next_request().expect("request");
        handle.shutdown();

        thread::sleep(Duration::from_millis(50));
        assert!(!caller.is_finished(), "caller must keep waiting for acknowledgement");

        match request {
            Request::SubmitHashrate(envelope) => envelope.acknowledge(),
            other => panic!("unexpected request {other:?}"),
        }
        assert!(caller.join().unwrap());
    }

    fn buffered_sealer() -> (SealerApi, EngineHandle) {
        let config = SealerConfig {
            pow_mode: PowMode::Normal,
            mailbox_capacity: 4,
        };
        remote_sealer(&config, Arc::new(FixedHashrate(0))).expect("sealer")
    }

    fn wait_until_queued(handle: &EngineHandle, count: usize) {
        while handle.requests().pending() < count {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn queued_hash_rate_released_by_shutdown() {
        let (api, handle) = buffered_sealer();
        let caller = thread::spawn(move || api.submit_hash_rate(HexU64(10), Hash([9; 32])));

        wait_until_queued(&handle, 1);
        handle.shutdown();

        assert!(caller.join().unwrap());
    }

    #[test]
    fn queued_requests_released_when_engine_handle_dropped() {
        let (api, handle) = buffered_sealer();
        let rate = api.clone();
        let rate_caller = thread::spawn(move || rate.submit_hash_rate(HexU64(10), Hash([9; 32])));
        let work_caller = thread::spawn(move || api.get_work());

        wait_until_queued(&handle, 2);
        drop(handle);

        assert!(rate_caller.join().unwrap());
        assert_eq!(work_caller.join().unwrap(), Err(Error::Stopped));
    }

    #[test]
    fn get_hashrate_never_blocks() {
        let rate = Arc::new(AtomicU64::new(42));
        let (tx, _rx) = mailbox(0);
        let (trigger, signal) = shutdown();
        let api = SealerApiBuilder::default()
            .mailbox(tx)
            .shutdown(signal)
            .hashrate(rate.clone())
            .build_validated()
            .expect("api");

        let blocked = api.clone();
        let waiter =
            thread::spawn(move || blocked.submit_work(nonce(1), Hash([1; 32]), Hash([2; 32])));
        thread::sleep(Duration::from_millis(20));

        assert_eq!(api.get_hashrate(), 42);
        rate.store(43, Ordering::Relaxed);
        assert_eq!(api.get_hashrate(), 43);
        assert!(!waiter.is_finished());

        drop(trigger);
        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn builder_requires_collaborators() {
        let err = SealerApiBuilder::default()
            .mode(PowMode::Test)
            .build_validated()
            .unwrap_err();
        assert_eq!(err, Error::InvalidConfig("mailbox must be provided".into()));
    }
}
