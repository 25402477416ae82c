//! Data structures shared across the deployment flow.

pub mod artifact;
pub mod instance;
pub mod network;
pub mod operation;
pub mod run;
pub mod store;

pub use artifact::Artifact;
pub use instance::{Image, Instance, InstanceConfig, MetadataItem};
pub use network::FirewallRule;
pub use operation::{Operation, OperationErrorPayload, OperationStatus};
pub use run::{DeployPhase, TeardownRecord};
pub use store::Bucket;
