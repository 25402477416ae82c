//! Orchestration logic: packaging, storage, network policy, instance
//! lifecycle, operation waiting, and the end-to-end flow.

pub mod instances;
pub mod network;
pub mod orchestrator;
pub mod package;
pub mod storage;
pub mod waiter;

pub use instances::InstanceLifecycleManager;
pub use network::NetworkPolicyManager;
pub use orchestrator::Orchestrator;
pub use package::Packager;
pub use storage::ArtifactStore;
pub use waiter::{OperationWaiter, PollPolicy};
