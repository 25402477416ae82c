//! Error taxonomy for the deployment flow.
//!
//! Each collaborator owns one variant. Nothing recovers from another
//! component's error: the orchestrator aborts the run and surfaces it,
//! after tearing down any instance it already created.

use thiserror::Error;

use crate::domain::OperationErrorPayload;

/// Errors that abort a deployment run
#[derive(Debug, Error)]
pub enum Error {
    /// Local filesystem failure (packaging, teardown record, stdin)
    #[error("i/o failure: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Bucket or blob operation failure
    #[error("object store error: {0}")]
    Store(String),

    /// Firewall rule lookup or creation failure
    #[error("network policy error: {0}")]
    Policy(String),

    /// Instance CRUD or image lookup call failure
    #[error("provider error: {0}")]
    Provider(String),

    /// An asynchronous operation reached DONE carrying an error payload
    #[error("operation '{operation}' failed: {payload}")]
    Operation {
        operation: String,
        payload: OperationErrorPayload,
    },

    /// The waiter exhausted its attempts before the operation reached DONE
    #[error("operation '{operation}' still not done after {attempts} polls ({waited_secs}s)")]
    Timeout {
        operation: String,
        attempts: u32,
        waited_secs: u64,
    },
}

impl Error {
    /// Wrap an I/O error with a short description of what was being done
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_display_names_no_single_component() {
        // The variant covers packaging, the teardown record, and stdin,
        // so the message must not claim one of them
        let err = Error::io(
            "waiting for keypress",
            std::io::Error::other("stdin closed"),
        );
        assert_eq!(err.to_string(), "i/o failure: waiting for keypress");
    }
}
