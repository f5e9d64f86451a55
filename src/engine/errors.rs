// Error types reported by the extraction engine

use thiserror::Error;

use super::diagnostics::{diagnose_error, BlockingReason};

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// yt-dlp or python not found in system
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Engine did not answer within the allotted time
    #[error("engine timed out after {0}s")]
    Timeout(u64),

    /// Command could not be spawned or awaited
    #[error("execution error: {0}")]
    Execution(String),

    /// Failed to parse engine JSON output
    #[error("parse error: {0}")]
    Parse(String),

    /// The requested data does not exist for this resource (no captions, etc.)
    #[error("not available: {0}")]
    Unavailable(String),

    /// Engine ran and reported a failure
    #[error("{message}")]
    Failed {
        message: String,
        reason: Option<BlockingReason>,
    },
}

impl EngineError {
    /// Errors that retrying cannot fix.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::ToolNotFound(_) | Self::Unavailable(_) => true,
            Self::Failed {
                reason: Some(reason),
                ..
            } => reason.is_permanent(),
            _ => false,
        }
    }

    pub fn blocking_reason(&self) -> Option<BlockingReason> {
        match self {
            Self::Failed { reason, .. } => *reason,
            Self::Timeout(_) => Some(BlockingReason::NetworkTimeout),
            _ => None,
        }
    }
}

// Classify raw stderr output from the engine
impl From<String> for EngineError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("command not found") || lower.contains("no such file") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("invalid json") || lower.contains("failed to parse json") {
            return Self::Parse(s);
        }

        let message = s
            .lines()
            .map(str::trim)
            .find(|line| line.to_lowercase().starts_with("error:"))
            .unwrap_or_else(|| s.trim())
            .to_string();

        Self::Failed {
            reason: diagnose_error(&s),
            message,
        }
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_keeps_error_line() {
        let err = EngineError::from(
            "WARNING: something\nERROR: [youtube] abc: Video unavailable\n".to_string(),
        );
        match err {
            EngineError::Failed { message, reason } => {
                assert_eq!(message, "ERROR: [youtube] abc: Video unavailable");
                assert_eq!(reason, Some(BlockingReason::VideoUnavailable));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_permanent_reason_is_terminal() {
        assert!(EngineError::from("ERROR: Private video").is_terminal());
        assert!(!EngineError::from("ERROR: HTTP Error 429: Too Many Requests").is_terminal());
        assert!(!EngineError::Timeout(30).is_terminal());
        assert!(EngineError::ToolNotFound("yt-dlp".into()).is_terminal());
    }
}
