//! Service identity derived from a discovered API Gateway resource
//!
//! This module provides:
//! - `RawResource`: the descriptor handed over by a discovery source
//! - `ServiceIdentity`: canonical name, stage, address and tag views of one resource
//! - Tag sanitation for catalog-safe metadata (see [`sanitize`])

mod sanitize;

pub use sanitize::sanitize;

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag carrying the deployment stage, stripped from the resource name
pub const STAGE_TAG: &str = "STAGE";

/// Tag that overrides the derived service name entirely
pub const SERVICE_TAG: &str = "service";

/// Raw resource descriptor as reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResource {
    /// Provider-assigned stable identifier
    pub resource_id: Option<String>,
    /// Resource name as reported by the provider
    pub name: Option<String>,
    /// Tags; a key may be reported without a value
    #[serde(default)]
    pub tags: HashMap<String, Option<String>>,
    /// Deployed stage names, in listing order
    #[serde(default)]
    pub stage_names: Vec<String>,
}

impl RawResource {
    pub fn new(resource_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), Some(value.into()));
        self
    }

    pub fn with_stage_names(mut self, stage_names: Vec<String>) -> Self {
        self.stage_names = stage_names;
        self
    }
}

/// Immutable identity of one discovered gateway for the current cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceIdentity {
    resource_id: String,
    raw_name: String,
    region: String,
    raw_tags: HashMap<String, String>,
    stage_names: Vec<String>,
}

impl ServiceIdentity {
    /// Build an identity from a raw descriptor
    ///
    /// Fails when the resource id, name or region is missing or empty, or when
    /// the canonical name comes out empty; the caller skips that resource for
    /// the cycle.
    pub fn new(resource: RawResource, region: impl Into<String>) -> Result<Self> {
        let region = region.into();
        if region.is_empty() {
            return Err(SyncError::InvalidResource("region is required".to_string()));
        }

        let resource_id = resource
            .resource_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SyncError::InvalidResource("resource id is required".to_string()))?;

        let raw_name = resource.name.filter(|name| !name.is_empty()).ok_or_else(|| {
            SyncError::InvalidResource(format!("resource {} has no name", resource_id))
        })?;

        // Keys reported without a value are dropped here, once
        let raw_tags = resource
            .tags
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();

        let identity = Self {
            resource_id,
            raw_name,
            region,
            raw_tags,
            stage_names: resource.stage_names,
        };

        if identity.canonical_name().is_empty() {
            return Err(SyncError::InvalidResource(format!(
                "resource {} has an empty service name",
                identity.resource_id
            )));
        }

        Ok(identity)
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn stage_names(&self) -> &[String] {
        &self.stage_names
    }

    /// Name used for both the catalog node and the catalog service
    ///
    /// A `service` tag always wins. Otherwise one `<stage>-` prefix and one
    /// `-<stage>` suffix are stripped from the raw name. A present but empty
    /// `STAGE` strips a bare `-` from either end.
    pub fn canonical_name(&self) -> String {
        if let Some(service) = self.raw_tags.get(SERVICE_TAG) {
            return service.clone();
        }

        let Some(stage) = self.raw_tags.get(STAGE_TAG) else {
            return self.raw_name.clone();
        };

        let prefix = format!("{}-", stage);
        let suffix = format!("-{}", stage);

        let name = self
            .raw_name
            .strip_prefix(prefix.as_str())
            .unwrap_or(&self.raw_name);
        let name = name.strip_suffix(suffix.as_str()).unwrap_or(name);

        name.to_string()
    }

    /// Value of the `STAGE` tag, or empty when absent
    pub fn stage(&self) -> &str {
        self.raw_tags.get(STAGE_TAG).map(String::as_str).unwrap_or("")
    }

    pub fn address(&self) -> String {
        format!(
            "{}.execute-api.{}.amazonaws.com",
            self.resource_id, self.region
        )
    }

    pub fn url(&self) -> String {
        format!("https://{}", self.address())
    }

    /// Unsanitized provider tags; filters and templates read these
    pub fn raw_tag_map(&self) -> &HashMap<String, String> {
        &self.raw_tags
    }

    /// Tags with keys and values sanitized independently
    ///
    /// Keys that collide after sanitation keep whichever value is written last;
    /// iteration order is unspecified.
    pub fn sanitized_tag_map(&self) -> HashMap<String, String> {
        self.raw_tags
            .iter()
            .map(|(key, value)| (sanitize(key), sanitize(value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str, tags: &[(&str, &str)]) -> ServiceIdentity {
        let mut resource = RawResource::new("abc123", name);
        for (k, v) in tags {
            resource = resource.with_tag(*k, *v);
        }
        ServiceIdentity::new(resource, "us-west-2").unwrap()
    }

    #[test]
    fn test_stage_prefix_stripped() {
        let svc = identity("staging-my-service", &[("STAGE", "staging")]);
        assert_eq!(svc.canonical_name(), "my-service");
    }

    #[test]
    fn test_stage_suffix_stripped() {
        let svc = identity("my-service-staging", &[("STAGE", "staging")]);
        assert_eq!(svc.canonical_name(), "my-service");
    }

    #[test]
    fn test_stage_prefix_and_suffix_stripped_once() {
        let svc = identity("dev-dev-api-dev-dev", &[("STAGE", "dev")]);
        assert_eq!(svc.canonical_name(), "dev-api-dev");
    }

    #[test]
    fn test_service_tag_wins() {
        let svc = identity(
            "staging-other-name",
            &[("service", "my-service"), ("STAGE", "staging")],
        );
        assert_eq!(svc.canonical_name(), "my-service");
    }

    #[test]
    fn test_no_stage_keeps_name() {
        let svc = identity("staging-my-service", &[]);
        assert_eq!(svc.canonical_name(), "staging-my-service");
        assert_eq!(svc.stage(), "");
    }

    #[test]
    fn test_stage_in_middle_not_stripped() {
        let svc = identity("my-staging-service", &[("STAGE", "staging")]);
        assert_eq!(svc.canonical_name(), "my-staging-service");
    }

    #[test]
    fn test_address_and_url() {
        let svc = identity("staging-my-service", &[("STAGE", "staging")]);
        assert_eq!(svc.address(), "abc123.execute-api.us-west-2.amazonaws.com");
        assert_eq!(
            svc.url(),
            "https://abc123.execute-api.us-west-2.amazonaws.com"
        );
    }

    #[test]
    fn test_tags_replacement() {
        let svc = identity(
            "staging-my-service",
            &[
                ("STAGE", "staging"),
                ("aws:cloudformation:logical-id", "ApiGatewayRestApi"),
            ],
        );

        let tags = svc.sanitized_tag_map();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["STAGE"], "staging");
        assert_eq!(tags["aws-cloudformation-logical-id"], "ApiGatewayRestApi");

        // Raw view is untouched
        assert!(svc.raw_tag_map().contains_key("aws:cloudformation:logical-id"));
    }

    #[test]
    fn test_valueless_tags_omitted() {
        let mut resource = RawResource::new("abc123", "api").with_tag("env", "dev");
        resource.tags.insert("empty".to_string(), None);

        let svc = ServiceIdentity::new(resource, "us-west-2").unwrap();
        assert_eq!(svc.raw_tag_map().len(), 1);
        assert!(!svc.raw_tag_map().contains_key("empty"));
    }

    #[test]
    fn test_untagged_resource() {
        let svc = identity("api", &[]);
        assert!(svc.raw_tag_map().is_empty());
        assert!(svc.sanitized_tag_map().is_empty());
    }

    #[test]
    fn test_missing_name_rejected() {
        let resource = RawResource {
            resource_id: Some("abc123".to_string()),
            ..Default::default()
        };
        let err = ServiceIdentity::new(resource, "us-west-2").unwrap_err();
        assert!(matches!(err, SyncError::InvalidResource(_)));

        let resource = RawResource::new("abc123", "");
        assert!(ServiceIdentity::new(resource, "us-west-2").is_err());
    }

    #[test]
    fn test_empty_stage_strips_bare_dashes() {
        let svc = identity("-api-", &[("STAGE", "")]);
        assert_eq!(svc.canonical_name(), "api");
        assert_eq!(svc.stage(), "");

        let svc = identity("api", &[("STAGE", "")]);
        assert_eq!(svc.canonical_name(), "api");
    }

    #[test]
    fn test_empty_canonical_name_rejected() {
        let resource = RawResource::new("abc123", "dev-").with_tag("STAGE", "dev");
        let err = ServiceIdentity::new(resource, "us-west-2").unwrap_err();
        assert!(matches!(err, SyncError::InvalidResource(_)));

        let resource = RawResource::new("abc123", "api").with_tag("service", "");
        assert!(ServiceIdentity::new(resource, "us-west-2").is_err());

        // Only the prefix is stripped when the name is exactly "<stage>-<stage>"
        let svc = identity("dev-dev", &[("STAGE", "dev")]);
        assert_eq!(svc.canonical_name(), "dev");
    }

    #[test]
    fn test_missing_id_rejected() {
        let resource = RawResource {
            name: Some("api".to_string()),
            ..Default::default()
        };
        assert!(ServiceIdentity::new(resource, "us-west-2").is_err());
    }
}
