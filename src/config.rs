use crate::error::Error;
use crate::mode::PowMode;
use serde::{Deserialize, Serialize};

/// Upper bound on buffered requests between gateways and the engine.
pub const MAX_MAILBOX_CAPACITY: usize = 1024;

/// Configuration of the remote sealing boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SealerConfig {
    pub pow_mode: PowMode,
    /// Requests that may wait in the mailbox before a push blocks. Zero means every push
    /// is a direct hand-off to the engine.
    pub mailbox_capacity: usize,
}

impl Default for SealerConfig {
    fn default() -> Self {
        Self {
            pow_mode: PowMode::Normal,
            mailbox_capacity: 0,
        }
    }
}

impl SealerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.mailbox_capacity > MAX_MAILBOX_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "mailbox_capacity must be <= {MAX_MAILBOX_CAPACITY}"
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: SealerConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
