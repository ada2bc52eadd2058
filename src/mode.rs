use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Operating mode of the proof-of-work engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowMode {
    #[default]
    Normal,
    Shared,
    Test,
    Fake,
    FullFake,
}

impl PowMode {
    /// Whether remote miners may fetch work and submit results in this mode.
    pub fn supports_remote(&self) -> bool {
        matches!(self, PowMode::Normal | PowMode::Test)
    }
}

impl Display for PowMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PowMode::Normal => "normal",
            PowMode::Shared => "shared",
            PowMode::Test => "test",
            PowMode::Fake => "fake",
            PowMode::FullFake => "fullfake",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pow mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for PowMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(PowMode::Normal),
            "shared" => Ok(PowMode::Shared),
            "test" => Ok(PowMode::Test),
            "fake" => Ok(PowMode::Fake),
            "fullfake" => Ok(PowMode::FullFake),
            _ => Err(UnknownMode(s.to_owned())),
        }
    }
}
