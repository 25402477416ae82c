//! Compute instance wire types.
//!
//! `InstanceConfig` is the body sent on insert; `Instance` is what the
//! provider reports back. Instances are never mutated in place: one is
//! created per run and destroyed as a unit.

use serde::{Deserialize, Serialize};

/// Configuration body for an instance insert call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    pub name: String,
    pub machine_type: String,
    pub disks: Vec<AttachedDisk>,
    pub network_interfaces: Vec<NetworkInterfaceConfig>,
    pub service_accounts: Vec<ServiceAccount>,
    pub metadata: Metadata,
    pub tags: Tags,
}

impl InstanceConfig {
    /// Look up a metadata value by key
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .items
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    pub boot: bool,
    pub auto_delete: bool,
    pub initialize_params: DiskInitializeParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskInitializeParams {
    pub source_image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceConfig {
    pub network: String,
    pub access_configs: Vec<AccessConfig>,
}

/// NAT access config; requesting one without an address yields an
/// ephemeral public IP at creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_tier: Option<String>,
    /// Assigned public address, present once provisioning has progressed
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "natIP")]
    pub nat_ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub email: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub items: Vec<MetadataItem>,
}

/// One key/value pair readable from inside the instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    pub value: String,
}

impl MetadataItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tags {
    pub items: Vec<String>,
}

/// An instance as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default, rename = "networkIP")]
    pub network_ip: Option<String>,
    #[serde(default)]
    pub access_configs: Vec<AccessConfig>,
}

impl Instance {
    /// Public addresses assigned to this instance, in interface order
    pub fn external_ips(&self) -> Vec<&str> {
        self.network_interfaces
            .iter()
            .flat_map(|nic| nic.access_configs.iter())
            .filter_map(|ac| ac.nat_ip.as_deref())
            .collect()
    }
}

/// A boot image resolved from an OS family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub self_link: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_external_ips() {
        let instance: Instance = serde_json::from_str(
            r#"{
                "name": "demo-instance",
                "status": "RUNNING",
                "networkInterfaces": [
                    {"networkIP": "10.0.0.2", "accessConfigs": [{"name": "External NAT", "natIP": "34.1.2.3"}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(instance.external_ips(), vec!["34.1.2.3"]);
    }

    #[test]
    fn test_instance_without_addresses() {
        let instance: Instance =
            serde_json::from_str(r#"{"name": "demo-instance"}"#).unwrap();
        assert!(instance.external_ips().is_empty());
    }

    #[test]
    fn test_metadata_lookup() {
        let config = InstanceConfig {
            name: "demo-instance".to_string(),
            machine_type: "zones/z/machineTypes/e2-micro".to_string(),
            disks: vec![],
            network_interfaces: vec![],
            service_accounts: vec![],
            metadata: Metadata {
                items: vec![
                    MetadataItem::new("zip", "app.tar.gz"),
                    MetadataItem::new("bucket", "b1"),
                ],
            },
            tags: Tags { items: vec![] },
        };

        assert_eq!(config.metadata_value("bucket"), Some("b1"));
        assert_eq!(config.metadata_value("missing"), None);
    }
}
