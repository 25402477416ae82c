//! Handles to asynchronous provider-side tasks.
//!
//! An Operation represents an in-flight infrastructure change (instance
//! insert or delete). It is transient: the waiter polls it until DONE and
//! then discards it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A provider-side asynchronous operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation identifier, used to poll for status
    pub name: String,

    /// Current status
    pub status: OperationStatus,

    /// Error payload, present only when the operation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrorPayload>,
}

impl Operation {
    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }
}

/// Status of an operation, a 3-state machine ending at `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
}

/// Error payload attached to a failed operation, passed through verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorPayload {
    #[serde(default)]
    pub errors: Vec<OperationErrorDetail>,
}

/// One error entry inside a failed operation's payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for OperationErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "unspecified operation error");
        }
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
