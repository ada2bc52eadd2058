use std::sync::atomic::{AtomicU64, Ordering};

/// Read access to the engine's aggregated hash rate (local and remote miners combined).
///
/// Implementations must not block.
pub trait HashrateSource: Send + Sync {
    /// Current combined rate in hashes per second.
    fn hashrate(&self) -> u64;
}

impl HashrateSource for AtomicU64 {
    fn hashrate(&self) -> u64 {
        self.load(Ordering::Relaxed)
    }
}

/// A source that always reports the same rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedHashrate(pub u64);

impl HashrateSource for FixedHashrate {
    fn hashrate(&self) -> u64 {
        self.0
    }
}
