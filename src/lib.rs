//! skiff - short-lived VM deployer
//!
//! Provisions a throwaway compute instance, ships a packaged application
//! to it through object storage, opens a firewall path, waits for the
//! user, then tears the instance down.
//!
//! # Architecture
//!
//! One strictly sequential flow per invocation:
//! - Every infrastructure mutation is an asynchronous provider operation,
//!   polled to completion before the next step begins
//! - Exactly one instance, bucket, and firewall rule are in flight at a time
//! - Once the instance exists, teardown runs on every exit path
//!
//! # Modules
//!
//! - `providers`: compute and object-store API boundaries (traits + REST clients)
//! - `core`: orchestration logic (Packager, ArtifactStore, NetworkPolicyManager,
//!   InstanceLifecycleManager, OperationWaiter, Orchestrator)
//! - `domain`: data structures (Artifact, Instance, Operation, FirewallRule)
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Deploy ./app to a fresh instance, pause, then tear it down
//! skiff my-project my-bucket
//!
//! # Open extra ports and skip the pause
//! skiff my-project my-bucket --ports 80,8080 --no-wait
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod providers;

// Re-export main types at crate root for convenience
pub use crate::core::{Orchestrator, PollPolicy};
pub use config::DeployConfig;
pub use domain::{Artifact, DeployPhase, Instance, Operation, OperationStatus};
pub use error::Error;
pub use providers::{Compute, ObjectStore};
