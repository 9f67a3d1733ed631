//! Error types for process management

use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::status::ProcessState;

/// Process management errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Failed to spawn process
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(#[from] io::Error),

    /// Wait deadline elapsed before the process exited
    #[error("Timeout elapsed after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Process exited unsuccessfully (non-zero code or killed by a signal)
    #[error(transparent)]
    Exit(#[from] ExitError),

    /// Failed to deliver a signal to the process
    #[error("Failed to send {signal} to pid {pid}: {source}")]
    SignalFailed {
        signal: &'static str,
        pid: u32,
        #[source]
        source: io::Error,
    },

    /// Forced termination failed
    #[error("Failed to kill pid {pid}: {source}")]
    KillFailed {
        pid: u32,
        #[source]
        source: io::Error,
    },

    /// The OS reported an error while reaping the process
    #[error("Failed to wait for process: {0}")]
    WaitFailed(Arc<io::Error>),

    /// The reaper went away without reporting a result
    #[error("Process reaper stopped before the process exited")]
    ReaperLost,
}

impl ProcessError {
    /// True when this is a wait timeout, which leaves the process running
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::Timeout { .. })
    }

    /// Terminal state carried by an [`ExitError`], if any
    pub fn exit_state(&self) -> Option<&ProcessState> {
        match self {
            ProcessError::Exit(e) => Some(e.state()),
            _ => None,
        }
    }
}

/// Unsuccessful terminal outcome of a process.
///
/// Displays exactly like the process state, e.g. `exit status 42` or `signal: killed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{state}")]
pub struct ExitError {
    state: ProcessState,
}

impl ExitError {
    pub(crate) fn new(state: ProcessState) -> Self {
        Self { state }
    }

    /// Final process state
    pub fn state(&self) -> &ProcessState {
        &self.state
    }
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Termination;

    #[test]
    fn test_exit_error_displays_state() {
        let err = ProcessError::from(ExitError::new(ProcessState::new(7, Termination::Exited(42))));
        assert_eq!(err.to_string(), "exit status 42");
        assert_eq!(err.exit_state().map(|s| s.pid()), Some(7));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_is_timeout() {
        let err = ProcessError::Timeout {
            timeout: Duration::from_secs(1),
        };
        assert!(err.is_timeout());
        assert!(err.exit_state().is_none());
    }
}
