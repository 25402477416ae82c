//! Instance lifecycle manager.
//!
//! Builds the full instance configuration (boot disk, NIC with ephemeral
//! public address, service account scopes, bootstrap metadata) and issues
//! the asynchronous create/delete calls. Waiting for the returned
//! operations is the caller's job.

use std::sync::Arc;

use tracing::info;

use crate::config::DeployConfig;
use crate::domain::instance::{
    AccessConfig, AttachedDisk, DiskInitializeParams, Metadata, NetworkInterfaceConfig,
    ServiceAccount, Tags,
};
use crate::domain::{Artifact, Instance, InstanceConfig, MetadataItem, Operation};
use crate::error::Result;
use crate::providers::Compute;

use super::network::TARGET_TAG;

/// Script run by the instance at boot; fetches and starts the payload
const STARTUP_SCRIPT: &str = include_str!("../../assets/startup-script.sh");

/// Issues create/get/list/delete calls for the deployment's instance
pub struct InstanceLifecycleManager {
    compute: Arc<dyn Compute>,
    project: String,
    zone: String,
    machine_type: String,
    image_project: String,
    image_family: String,
}

impl InstanceLifecycleManager {
    pub fn new(compute: Arc<dyn Compute>, config: &DeployConfig) -> Self {
        Self {
            compute,
            project: config.project.clone(),
            zone: config.zone.clone(),
            machine_type: config.machine_type.clone(),
            image_project: config.image_project.clone(),
            image_family: config.image_family.clone(),
        }
    }

    /// Issue an asynchronous instance insert and return its operation
    /// handle immediately.
    ///
    /// The instance's metadata carries the bootstrap script plus the
    /// artifact's bucket and blob name so it can self-install the payload
    /// on boot.
    pub async fn create(
        &self,
        name: &str,
        bucket: &str,
        artifact: &Artifact,
    ) -> Result<Operation> {
        let image = self
            .compute
            .image_from_family(&self.image_project, &self.image_family)
            .await?;
        info!(image = %image.self_link, "resolved boot image");

        let config = self.build_config(name, bucket, artifact, &image.self_link);
        self.compute
            .insert_instance(&self.project, &self.zone, &config)
            .await
    }

    /// Fetch a single instance's current description, including assigned
    /// addresses once provisioning has progressed far enough
    pub async fn get(&self, name: &str) -> Result<Instance> {
        self.compute
            .get_instance(&self.project, &self.zone, name)
            .await
    }

    /// All instances in the zone; empty when none exist
    pub async fn list(&self) -> Result<Vec<Instance>> {
        self.compute.list_instances(&self.project, &self.zone).await
    }

    /// Issue an asynchronous instance delete and return its handle
    pub async fn delete(&self, name: &str) -> Result<Operation> {
        self.compute
            .delete_instance(&self.project, &self.zone, name)
            .await
    }

    fn build_config(
        &self,
        name: &str,
        bucket: &str,
        artifact: &Artifact,
        source_image: &str,
    ) -> InstanceConfig {
        InstanceConfig {
            name: name.to_string(),
            machine_type: format!("zones/{}/machineTypes/{}", self.zone, self.machine_type),
            disks: vec![AttachedDisk {
                boot: true,
                auto_delete: true,
                initialize_params: DiskInitializeParams {
                    source_image: source_image.to_string(),
                },
            }],
            network_interfaces: vec![NetworkInterfaceConfig {
                network: "global/networks/default".to_string(),
                // An access config with no address requests an ephemeral
                // public IP
                access_configs: vec![AccessConfig {
                    name: "External NAT".to_string(),
                    network_tier: Some("PREMIUM".to_string()),
                    nat_ip: None,
                }],
            }],
            service_accounts: vec![ServiceAccount {
                email: "default".to_string(),
                scopes: vec![
                    "https://www.googleapis.com/auth/devstorage.read_write".to_string(),
                    "https://www.googleapis.com/auth/logging.write".to_string(),
                ],
            }],
            metadata: Metadata {
                items: vec![
                    MetadataItem::new("startup-script", STARTUP_SCRIPT),
                    MetadataItem::new("zip", artifact.blob_name.clone()),
                    MetadataItem::new("bucket", bucket),
                ],
            },
            tags: Tags {
                items: vec![TARGET_TAG.to_string(), "http-server".to_string()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeployConfig;

    use async_trait::async_trait;
    use std::path::PathBuf;

    use crate::domain::{FirewallRule, Image, OperationStatus};
    use crate::error::Error;

    struct StubCompute;

    #[async_trait]
    impl Compute for StubCompute {
        async fn insert_instance(
            &self,
            _project: &str,
            _zone: &str,
            config: &InstanceConfig,
        ) -> Result<Operation> {
            // Echo the instance name so the test can see what was sent
            Ok(Operation {
                name: format!("insert-{}", config.name),
                status: OperationStatus::Pending,
                error: None,
            })
        }

        async fn get_instance(&self, _: &str, _: &str, _: &str) -> Result<Instance> {
            Err(Error::Provider("not implemented".to_string()))
        }

        async fn list_instances(&self, _: &str, _: &str) -> Result<Vec<Instance>> {
            Ok(vec![])
        }

        async fn delete_instance(&self, _: &str, _: &str, name: &str) -> Result<Operation> {
            Ok(Operation {
                name: format!("delete-{}", name),
                status: OperationStatus::Pending,
                error: None,
            })
        }

        async fn get_zone_operation(&self, _: &str, _: &str, _: &str) -> Result<Operation> {
            Err(Error::Provider("not implemented".to_string()))
        }

        async fn image_from_family(&self, project: &str, family: &str) -> Result<Image> {
            Ok(Image {
                self_link: format!("projects/{}/global/images/{}-v1", project, family),
                name: None,
            })
        }

        async fn get_firewall(&self, _: &str, _: &str) -> Result<Option<FirewallRule>> {
            Ok(None)
        }

        async fn insert_firewall(&self, _: &str, _: &FirewallRule) -> Result<()> {
            Ok(())
        }
    }

    fn test_artifact() -> Artifact {
        Artifact::new(
            PathBuf::from("/tmp/skiff/app.tar.gz"),
            vec!["main.py".to_string()],
            42,
            "00".repeat(32),
        )
    }

    #[test]
    fn test_instance_config_shape() {
        let config = DeployConfig::new("p1", "b1");
        let manager = InstanceLifecycleManager::new(Arc::new(StubCompute), &config);

        let body = manager.build_config(
            "demo-instance",
            "b1",
            &test_artifact(),
            "projects/debian-cloud/global/images/debian-12-v1",
        );

        assert_eq!(
            body.machine_type,
            "zones/us-central1-f/machineTypes/e2-micro"
        );
        assert!(body.disks[0].boot);
        assert!(body.disks[0].auto_delete);
        assert_eq!(body.metadata_value("zip"), Some("app.tar.gz"));
        assert_eq!(body.metadata_value("bucket"), Some("b1"));
        assert!(body
            .metadata_value("startup-script")
            .is_some_and(|s| !s.is_empty()));
        assert!(body.tags.items.contains(&TARGET_TAG.to_string()));
    }

    #[tokio::test]
    async fn test_create_resolves_image_then_inserts() {
        let config = DeployConfig::new("p1", "b1");
        let manager = InstanceLifecycleManager::new(Arc::new(StubCompute), &config);

        let operation = manager
            .create("demo-instance", "b1", &test_artifact())
            .await
            .unwrap();

        assert_eq!(operation.name, "insert-demo-instance");
        assert!(!operation.is_done());
    }
}
