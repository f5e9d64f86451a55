// Error taxonomy surfaced by the extraction layer

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::diagnostics::BlockingReason;
use crate::engine::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    EngineTimeout,
    EngineFailure,
    ExhaustedRetries,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::EngineTimeout => "engine_timeout",
            Self::EngineFailure => "engine_failure",
            Self::ExhaustedRetries => "exhausted_retries",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// Malformed resource identifier or parameter. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The engine did not answer within the configured timeout
    #[error("engine timed out after {seconds}s")]
    EngineTimeout { seconds: u64 },

    /// The engine reported a failure
    #[error("engine failure: {source}")]
    EngineFailure {
        #[source]
        source: EngineError,
    },

    /// Every attempt failed; carries the last error
    #[error("gave up after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        last: Box<ExtractionError>,
    },
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::EngineTimeout { .. } => ErrorKind::EngineTimeout,
            Self::EngineFailure { .. } => ErrorKind::EngineFailure,
            Self::ExhaustedRetries { .. } => ErrorKind::ExhaustedRetries,
        }
    }

    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EngineTimeout { .. } => true,
            Self::EngineFailure { source } => !source.is_terminal(),
            Self::InvalidInput(_) | Self::ExhaustedRetries { .. } => false,
        }
    }

    pub fn blocking_reason(&self) -> Option<BlockingReason> {
        match self {
            Self::EngineTimeout { .. } => Some(BlockingReason::NetworkTimeout),
            Self::EngineFailure { source } => source.blocking_reason(),
            Self::ExhaustedRetries { last, .. } => last.blocking_reason(),
            Self::InvalidInput(_) => None,
        }
    }

    /// Caller-facing shape used in tool responses
    pub fn to_report(&self) -> ErrorReport {
        let reason = self.blocking_reason();
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            reason,
            hint: reason.and_then(|r| r.hint()).map(str::to_string),
        }
    }
}

impl From<EngineError> for ExtractionError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Timeout(seconds) => Self::EngineTimeout { seconds },
            source => Self::EngineFailure { source },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockingReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
