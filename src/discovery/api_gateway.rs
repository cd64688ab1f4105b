// AWS API Gateway REST API discovery
//
// Credentials are resolved through the standard AWS provider chain.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_apigateway::config::Region;
use aws_sdk_apigateway::error::DisplayErrorContext;
use aws_sdk_apigateway::Client;
use std::collections::HashMap;

use crate::discovery::DiscoverySource;
use crate::error::{Result, SyncError};
use crate::service::RawResource;

/// Largest page the GetRestApis API accepts
const PAGE_LIMIT: i32 = 500;

/// Lists REST APIs and their stages in one region
pub struct ApiGatewayDiscovery {
    client: Client,
    region: String,
}

impl ApiGatewayDiscovery {
    /// Build a client for `region` using the environment's AWS credentials
    pub async fn new(region: impl Into<String>) -> Self {
        let region = region.into();

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
            region,
        }
    }

    async fn stage_names(&self, rest_api_id: &str) -> Result<Vec<String>> {
        let stages = self
            .client
            .get_stages()
            .rest_api_id(rest_api_id)
            .send()
            .await
            .map_err(|e| {
                SyncError::Discovery(format!(
                    "Failed to list stages for {}: {}",
                    rest_api_id,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(stages
            .item()
            .iter()
            .filter_map(|stage| stage.stage_name().map(str::to_string))
            .collect())
    }
}

#[async_trait]
impl DiscoverySource for ApiGatewayDiscovery {
    async fn discover(&self) -> Result<Vec<RawResource>> {
        let mut resources = Vec::new();
        let mut position: Option<String> = None;

        loop {
            let page = self
                .client
                .get_rest_apis()
                .limit(PAGE_LIMIT)
                .set_position(position.take())
                .send()
                .await
                .map_err(|e| {
                    SyncError::Discovery(format!(
                        "Failed to list rest apis: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

            for api in page.items() {
                let stage_names = match api.id() {
                    Some(id) => self.stage_names(id).await?,
                    None => Vec::new(),
                };

                let tags: HashMap<String, Option<String>> = api
                    .tags()
                    .map(|tags| {
                        tags.iter()
                            .map(|(k, v)| (k.clone(), Some(v.clone())))
                            .collect()
                    })
                    .unwrap_or_default();

                resources.push(RawResource {
                    resource_id: api.id().map(str::to_string),
                    name: api.name().map(str::to_string),
                    tags,
                    stage_names,
                });
            }

            match page.position() {
                Some(next) if !next.is_empty() => position = Some(next.to_string()),
                _ => break,
            }
        }

        tracing::debug!(items = resources.len(), region = %self.region, "Got rest-apis");

        Ok(resources)
    }
}
