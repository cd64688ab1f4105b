//! Catalog registration records
//!
//! Every gateway is registered as its own external node carrying a single
//! service of the same name. The catalog performs no probing of these nodes, so
//! each record carries one health check asserting `passing`.

use crate::service::ServiceIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies records written by this tool
pub const REGISTERED_BY: &str = "consul-api-gateway-sync";

/// Service metadata key marking the registration as externally sourced
pub const EXTERNAL_SOURCE_KEY: &str = "external-source";

/// Value of the external source marker
pub const EXTERNAL_SOURCE: &str = "aws";

/// Port API Gateway endpoints listen on
pub const DEFAULT_PORT: u16 = 443;

/// Static policy applied to every registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPolicy {
    pub port: u16,
    /// Metadata attached to the synthetic node
    pub node_meta: HashMap<String, String>,
    /// Metadata overriding the service's tag-derived metadata
    pub service_meta: HashMap<String, String>,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            node_meta: default_node_meta(),
            service_meta: HashMap::new(),
        }
    }
}

/// Node metadata marking the node as external and probed elsewhere
pub fn default_node_meta() -> HashMap<String, String> {
    HashMap::from([
        ("external-node".to_string(), "true".to_string()),
        ("external-probe".to_string(), "true".to_string()),
        ("registered-by".to_string(), REGISTERED_BY.to_string()),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Passing,
}

/// Health check attached to a registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub id: String,
    pub name: String,
    pub node: String,
    pub service_name: String,
    pub notes: String,
    pub status: HealthStatus,
}

/// Registration handed to the catalog sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub node: String,
    pub node_metadata: HashMap<String, String>,
    pub address: String,
    pub service_name: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub service_metadata: HashMap<String, String>,
    pub health_check: HealthCheck,
    /// Registering the service must never rewrite the node's other attributes
    pub skip_node_update: bool,
}

/// Compose the registration for one eligible service
pub fn build(
    identity: &ServiceIdentity,
    rendered_tags: Vec<String>,
    policy: &RegistrationPolicy,
) -> RegistrationRecord {
    let name = identity.canonical_name();

    let mut service_metadata = identity.sanitized_tag_map();
    service_metadata.insert(EXTERNAL_SOURCE_KEY.to_string(), EXTERNAL_SOURCE.to_string());
    service_metadata.extend(policy.service_meta.clone());

    let health_check = HealthCheck {
        id: format!("service:{}", name),
        name: name.clone(),
        node: name.clone(),
        service_name: name.clone(),
        notes: format!("created by {}", REGISTERED_BY),
        status: HealthStatus::Passing,
    };

    RegistrationRecord {
        node: name.clone(),
        node_metadata: policy.node_meta.clone(),
        address: identity.address(),
        service_name: name,
        port: policy.port,
        tags: rendered_tags,
        service_metadata,
        health_check,
        skip_node_update: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::RawResource;

    fn staging_service() -> ServiceIdentity {
        let resource = RawResource::new("abc123", "staging-my-service")
            .with_tag("STAGE", "staging")
            .with_tag("aws:cloudformation:logical-id", "ApiGatewayRestApi");
        ServiceIdentity::new(resource, "us-west-2").unwrap()
    }

    #[test]
    fn test_build_record() {
        let record = build(
            &staging_service(),
            vec!["traefik.enable=true".to_string()],
            &RegistrationPolicy::default(),
        );

        assert_eq!(record.node, "my-service");
        assert_eq!(record.service_name, "my-service");
        assert_eq!(record.address, "abc123.execute-api.us-west-2.amazonaws.com");
        assert_eq!(record.port, 443);
        assert_eq!(record.tags, vec!["traefik.enable=true"]);
        assert!(record.skip_node_update);

        assert_eq!(record.service_metadata["external-source"], "aws");
        assert_eq!(record.service_metadata["STAGE"], "staging");
        assert_eq!(
            record.service_metadata["aws-cloudformation-logical-id"],
            "ApiGatewayRestApi"
        );

        assert_eq!(record.node_metadata["registered-by"], REGISTERED_BY);
        assert_eq!(record.node_metadata["external-node"], "true");
    }

    #[test]
    fn test_health_check_passing() {
        let record = build(&staging_service(), vec![], &RegistrationPolicy::default());
        let check = &record.health_check;

        assert_eq!(check.id, "service:my-service");
        assert_eq!(check.name, "my-service");
        assert_eq!(check.node, "my-service");
        assert_eq!(check.status, HealthStatus::Passing);
    }

    #[test]
    fn test_static_metadata_takes_precedence() {
        let policy = RegistrationPolicy {
            service_meta: HashMap::from([
                ("external-source".to_string(), "apigateway".to_string()),
                ("STAGE".to_string(), "pinned".to_string()),
                ("team".to_string(), "platform".to_string()),
            ]),
            ..Default::default()
        };

        let record = build(&staging_service(), vec![], &policy);

        assert_eq!(record.service_metadata["external-source"], "apigateway");
        assert_eq!(record.service_metadata["STAGE"], "pinned");
        assert_eq!(record.service_metadata["team"], "platform");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&HealthStatus::Passing).unwrap();
        assert_eq!(json, "\"passing\"");
    }
}
