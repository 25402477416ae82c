//! Provider boundaries for compute and object storage.
//!
//! Any provider exposing instance CRUD plus async operation polling
//! satisfies [`Compute`]; any object store with get-or-create-bucket and
//! overwrite-put semantics satisfies [`ObjectStore`]. The bundled
//! implementations speak the GCE/GCS REST APIs.

pub mod gce;
pub mod gcs;

use async_trait::async_trait;

use crate::domain::{Bucket, FirewallRule, Image, Instance, InstanceConfig, Operation};
use crate::error::Result;

pub use gce::GceCompute;
pub use gcs::GcsStore;

/// Compute provider: instance CRUD, image lookup, firewalls, operation polling
#[async_trait]
pub trait Compute: Send + Sync {
    /// Issue an asynchronous instance insert; returns without blocking
    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        config: &InstanceConfig,
    ) -> Result<Operation>;

    /// Fetch one instance's current description
    async fn get_instance(&self, project: &str, zone: &str, name: &str) -> Result<Instance>;

    /// All instances in the zone; empty when none exist
    async fn list_instances(&self, project: &str, zone: &str) -> Result<Vec<Instance>>;

    /// Issue an asynchronous instance delete; returns without blocking
    async fn delete_instance(&self, project: &str, zone: &str, name: &str) -> Result<Operation>;

    /// Current status of a zone operation
    async fn get_zone_operation(
        &self,
        project: &str,
        zone: &str,
        operation: &str,
    ) -> Result<Operation>;

    /// Latest image in an OS family
    async fn image_from_family(&self, image_project: &str, family: &str) -> Result<Image>;

    /// Look up a firewall rule by name; `None` means true not-found
    async fn get_firewall(&self, project: &str, name: &str) -> Result<Option<FirewallRule>>;

    /// Create a firewall rule
    async fn insert_firewall(&self, project: &str, rule: &FirewallRule) -> Result<()>;
}

/// Object store: bucket get/create and overwrite-put of blobs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Look up a bucket by name; `None` means true not-found, any other
    /// failure propagates
    async fn get_bucket(&self, name: &str) -> Result<Option<Bucket>>;

    /// Create a bucket with the given storage class and location
    async fn create_bucket(
        &self,
        project: &str,
        name: &str,
        storage_class: &str,
        location: &str,
    ) -> Result<Bucket>;

    /// Upload bytes as a blob, fully overwriting any prior blob of that name
    async fn put_object(&self, bucket: &str, name: &str, bytes: Vec<u8>) -> Result<()>;
}
