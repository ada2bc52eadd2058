use serde::{Deserialize, Serialize};

/// Message reported when the engine is gone.
pub const STOPPED_MESSAGE: &str = "ethash stopped";
/// Message reported when the engine mode forbids remote interaction.
pub const NOT_SUPPORTED_MESSAGE: &str = "not supported";

/// JSON-RPC code for a failed detailed work submission.
pub const CANNOT_SUBMIT_WORK_CODE: i32 = -32005;
/// Fixed message accompanying [`CANNOT_SUBMIT_WORK_CODE`].
pub const CANNOT_SUBMIT_WORK_MESSAGE: &str = "Cannot submit work.";
/// JSON-RPC code for errors that carry no dedicated code.
pub const DEFAULT_ERROR_CODE: i32 = -32000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("not supported")]
    NotSupported,
    #[error("ethash stopped")]
    Stopped,
    #[error("{0}")]
    Engine(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Reason an engine gives for declining a request.
///
/// Invalid, stale and unknown work are deliberately one kind; only the text differs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct Rejection(String);

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Rejection(message.into())
    }

    /// No work package has been produced yet.
    pub fn no_work() -> Self {
        Rejection::new("no mining work available yet")
    }

    /// The solution does not verify, or references superseded work.
    pub fn invalid_seal() -> Self {
        Rejection::new("invalid or stale proof-of-work solution")
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Structured failure of a detailed work submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot submit work.")]
pub struct CannotSubmitWork {
    reason: String,
}

impl CannotSubmitWork {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> i32 {
        CANNOT_SUBMIT_WORK_CODE
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Error object handed to the RPC transport for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl From<CannotSubmitWork> for RpcError {
    fn from(err: CannotSubmitWork) -> Self {
        RpcError {
            code: err.code(),
            message: CANNOT_SUBMIT_WORK_MESSAGE.to_owned(),
            data: Some(serde_json::Value::String(err.reason)),
        }
    }
}

impl From<Error> for RpcError {
    fn from(err: Error) -> Self {
        RpcError {
            code: DEFAULT_ERROR_CODE,
            message: err.to_string(),
            data: None,
        }
    }
}
