//! GCE-flavored compute REST client.
//!
//! Thin JSON client over the v1 compute API. Credentials come from the
//! environment; the base URL is overridable so the client can be pointed
//! at an emulator.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{FirewallRule, Image, Instance, InstanceConfig, Operation};
use crate::error::{Error, Result};

use super::Compute;

const DEFAULT_BASE_URL: &str = "https://compute.googleapis.com/compute/v1";

/// REST client for a GCE-shaped compute API
pub struct GceCompute {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Wire shape of an instance list response
#[derive(Debug, Deserialize)]
struct InstanceList {
    #[serde(default)]
    items: Vec<Instance>,
}

impl GceCompute {
    /// Create a client using the supplied bearer token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
        }
    }

    /// Point the client at a different API endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("{} request failed: {}", what, e)))?;

        Self::decode(response, what).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "{} returned {}: {}",
                what,
                status,
                body.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("{} response was not valid JSON: {}", what, e)))
    }
}

#[async_trait]
impl Compute for GceCompute {
    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        config: &InstanceConfig,
    ) -> Result<Operation> {
        debug!(instance = %config.name, %zone, "inserting instance");

        let path = format!("projects/{}/zones/{}/instances", project, zone);
        let response = self
            .client
            .post(self.url(&path))
            .bearer_auth(&self.token)
            .json(config)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("instance insert failed: {}", e)))?;

        Self::decode(response, "instance insert").await
    }

    async fn get_instance(&self, project: &str, zone: &str, name: &str) -> Result<Instance> {
        let path = format!("projects/{}/zones/{}/instances/{}", project, zone, name);
        self.get_json(&path, "instance get").await
    }

    async fn list_instances(&self, project: &str, zone: &str) -> Result<Vec<Instance>> {
        let path = format!("projects/{}/zones/{}/instances", project, zone);
        let list: InstanceList = self.get_json(&path, "instance list").await?;
        Ok(list.items)
    }

    async fn delete_instance(&self, project: &str, zone: &str, name: &str) -> Result<Operation> {
        debug!(instance = %name, %zone, "deleting instance");

        let path = format!("projects/{}/zones/{}/instances/{}", project, zone, name);
        let response = self
            .client
            .delete(self.url(&path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("instance delete failed: {}", e)))?;

        Self::decode(response, "instance delete").await
    }

    async fn get_zone_operation(
        &self,
        project: &str,
        zone: &str,
        operation: &str,
    ) -> Result<Operation> {
        let path = format!(
            "projects/{}/zones/{}/operations/{}",
            project, zone, operation
        );
        self.get_json(&path, "operation get").await
    }

    async fn image_from_family(&self, image_project: &str, family: &str) -> Result<Image> {
        let path = format!(
            "projects/{}/global/images/family/{}",
            image_project, family
        );
        self.get_json(&path, "image family lookup").await
    }

    async fn get_firewall(&self, project: &str, name: &str) -> Result<Option<FirewallRule>> {
        let path = format!("projects/{}/global/firewalls/{}", project, name);
        let response = self
            .client
            .get(self.url(&path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Policy(format!("firewall lookup failed: {}", e)))?;

        // Only a true not-found maps to None; everything else is an error
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Policy(format!(
                "firewall lookup returned {}: {}",
                status,
                body.trim()
            )));
        }

        let rule = response
            .json()
            .await
            .map_err(|e| Error::Policy(format!("firewall response was not valid JSON: {}", e)))?;
        Ok(Some(rule))
    }

    async fn insert_firewall(&self, project: &str, rule: &FirewallRule) -> Result<()> {
        debug!(rule = %rule.name, "creating firewall rule");

        let path = format!("projects/{}/global/firewalls", project);
        let response = self
            .client
            .post(self.url(&path))
            .bearer_auth(&self.token)
            .json(rule)
            .send()
            .await
            .map_err(|e| Error::Policy(format!("firewall insert failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Policy(format!(
                "firewall insert returned {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let compute = GceCompute::new("TOKEN").with_base_url("http://localhost:9000/compute/v1");
        assert_eq!(
            compute.url("projects/p1/zones/us-central1-f/instances"),
            "http://localhost:9000/compute/v1/projects/p1/zones/us-central1-f/instances"
        );
    }
}
