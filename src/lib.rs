//! Remote sealing gateway for a long-running proof-of-work engine.
//!
//! Remote miners fetch work, submit seals and report hash rates through [`SealerApi`].
//! Every call is turned into an envelope with its own one-shot reply slots and handed to
//! the engine's mailbox; the engine answers on its own schedule. Engine shutdown unblocks
//! every pending call.
//!
//! ```no_run
//! use remote_sealer::{remote_sealer, FixedHashrate, SealerConfig};
//! use std::sync::Arc;
//!
//! let (api, engine) = remote_sealer(&SealerConfig::default(), Arc::new(FixedHashrate(0)))
//!     .expect("valid config");
//! std::thread::spawn(move || {
//!     while let Some(request) = engine.next_request() {
//!         // answer `request` from the mining loop
//!         drop(request);
//!     }
//! });
//! let _ = api.get_work();
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod hashrate;
pub mod mailbox;
pub mod mode;
pub mod reply;
pub mod shutdown;
pub mod types;

pub use api::{remote_sealer, SealerApi, SealerApiBuilder};
pub use config::SealerConfig;
pub use engine::{EngineHandle, RemoteEngine};
pub use envelope::{FetchWork, Request, SubmitHashrate, SubmitWork};
pub use error::{CannotSubmitWork, Error, Rejection, RpcError};
pub use hashrate::{FixedHashrate, HashrateSource};
pub use mailbox::{mailbox, MailboxReceiver, MailboxSender};
pub use mode::PowMode;
pub use shutdown::{shutdown, ShutdownSignal, ShutdownTrigger};
pub use types::{BlockNonce, Hash, HashrateReport, HexError, HexU64, Solution, WorkPackage};
