//! Deployment run phases and the durable teardown record.
//!
//! A run moves strictly forward through the phases; any collaborator error
//! sends it to `Failed`. There is no retry of a failed transition.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase of a deployment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployPhase {
    Init,
    PolicyReady,
    Packaged,
    Stored,
    InstanceCreating,
    InstanceReady,
    AwaitingUser,
    InstanceDeleting,
    Done,
    Failed,
}

impl DeployPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::PolicyReady => "policy-ready",
            Self::Packaged => "packaged",
            Self::Stored => "stored",
            Self::InstanceCreating => "instance-creating",
            Self::InstanceReady => "instance-ready",
            Self::AwaitingUser => "awaiting-user",
            Self::InstanceDeleting => "instance-deleting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Durable record of an instance that still needs deleting
///
/// Written before the run blocks on user input and removed once the delete
/// operation completes, so an interrupted run leaves evidence a recovery
/// pass can act on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeardownRecord {
    /// Run that created the instance
    pub run_id: Uuid,
    pub project: String,
    pub zone: String,
    pub instance_name: String,
    pub written_at: DateTime<Utc>,
}

impl TeardownRecord {
    pub fn new(run_id: Uuid, project: &str, zone: &str, instance_name: &str) -> Self {
        Self {
            run_id,
            project: project.to_string(),
            zone: zone.to_string(),
            instance_name: instance_name.to_string(),
            written_at: Utc::now(),
        }
    }

    /// Location of the record inside the staging directory
    pub fn path(staging_dir: &std::path::Path) -> PathBuf {
        staging_dir.join("teardown.json")
    }
}
