//! Firewall rule wire types.

use serde::{Deserialize, Serialize};

/// A named ingress firewall rule
///
/// Keyed by target tag, protocol, and port set. Ensured with
/// get-before-create semantics: an existing rule is returned unchanged,
/// even if its ports have drifted from the requested set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    pub name: String,
    pub network: String,
    pub direction: String,
    pub priority: u32,
    pub target_tags: Vec<String>,
    pub allowed: Vec<AllowedPorts>,
    pub source_ranges: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedPorts {
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,
    pub ports: Vec<String>,
}

impl FirewallRule {
    /// Build an ingress rule allowing TCP from anywhere to `ports`,
    /// scoped to instances carrying `target_tag`
    pub fn tcp_ingress(
        name: impl Into<String>,
        project: &str,
        target_tag: impl Into<String>,
        ports: &[String],
    ) -> Self {
        Self {
            name: name.into(),
            network: format!("projects/{}/global/networks/default", project),
            direction: "INGRESS".to_string(),
            priority: 1000,
            target_tags: vec![target_tag.into()],
            allowed: vec![AllowedPorts {
                ip_protocol: "tcp".to_string(),
                ports: ports.to_vec(),
            }],
            source_ranges: vec!["0.0.0.0/0".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_ingress_shape() {
        let rule = FirewallRule::tcp_ingress(
            "allow-dev-http",
            "p1",
            "dev-http-server",
            &["8080".to_string(), "80".to_string()],
        );

        assert_eq!(rule.direction, "INGRESS");
        assert_eq!(rule.network, "projects/p1/global/networks/default");
        assert_eq!(rule.allowed[0].ip_protocol, "tcp");
        assert_eq!(rule.allowed[0].ports, vec!["8080", "80"]);
        assert_eq!(rule.source_ranges, vec!["0.0.0.0/0"]);

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["allowed"][0]["IPProtocol"], "tcp");
        assert_eq!(json["targetTags"][0], "dev-http-server");
    }
}
