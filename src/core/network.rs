//! Network policy manager: idempotent ingress rule ensure.

use std::sync::Arc;

use tracing::info;

use crate::domain::FirewallRule;
use crate::error::Result;
use crate::providers::Compute;

/// Fixed name of the ingress rule this tool manages
pub const RULE_NAME: &str = "allow-dev-http";

/// Tag instances must carry for the rule to apply
pub const TARGET_TAG: &str = "dev-http-server";

/// Ensures an ingress firewall path exists for the configured ports
pub struct NetworkPolicyManager {
    compute: Arc<dyn Compute>,
    project: String,
}

impl NetworkPolicyManager {
    pub fn new(compute: Arc<dyn Compute>, project: impl Into<String>) -> Self {
        Self {
            compute,
            project: project.into(),
        }
    }

    /// Look up the fixed-named rule; create it if truly absent.
    ///
    /// An existing rule is returned unchanged: port or config drift on it
    /// is not reconciled.
    pub async fn ensure_ingress_rule(&self, ports: &[String]) -> Result<FirewallRule> {
        if let Some(existing) = self.compute.get_firewall(&self.project, RULE_NAME).await? {
            info!(rule = %existing.name, "firewall rule already exists");
            return Ok(existing);
        }

        let rule = FirewallRule::tcp_ingress(RULE_NAME, &self.project, TARGET_TAG, ports);
        self.compute.insert_firewall(&self.project, &rule).await?;
        info!(rule = %rule.name, ?ports, "created firewall rule");
        Ok(rule)
    }
}
