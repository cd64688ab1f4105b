// Consul catalog client: PUT /v1/catalog/register
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::catalog::CatalogSink;
use crate::error::{Result, SyncError};
use crate::registration::{HealthStatus, RegistrationRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Registers records with a Consul agent or server
pub struct ConsulCatalog {
    client: Client,
    address: String,
    datacenter: Option<String>,
}

impl ConsulCatalog {
    /// # Arguments
    /// * `address` - Base URL of the Consul HTTP API, e.g. `http://127.0.0.1:8500`
    /// * `datacenter` - Target datacenter; the agent's own when `None`
    pub fn new(address: impl Into<String>, datacenter: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            address: address.into().trim_end_matches('/').to_string(),
            datacenter,
        })
    }

    pub fn register_url(&self) -> String {
        format!("{}/v1/catalog/register", self.address)
    }
}

#[async_trait]
impl CatalogSink for ConsulCatalog {
    async fn register(&self, record: &RegistrationRecord) -> Result<()> {
        let body = ConsulRegistration::from(record);

        let mut request = self.client.put(self.register_url()).json(&body);
        if let Some(dc) = &self.datacenter {
            request = request.query(&[("dc", dc)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SyncError::Catalog(format!(
                "register {} returned {}: {}",
                record.service_name,
                status,
                message.trim()
            )));
        }

        Ok(())
    }
}

/// Body of a catalog register request, in Consul's field naming
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsulRegistration<'a> {
    pub node: &'a str,
    pub address: &'a str,
    pub node_meta: &'a HashMap<String, String>,
    pub service: ConsulService<'a>,
    pub checks: Vec<ConsulCheck<'a>>,
    pub skip_node_update: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsulService<'a> {
    pub service: &'a str,
    pub tags: &'a [String],
    pub port: u16,
    pub meta: &'a HashMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsulCheck<'a> {
    #[serde(rename = "CheckID")]
    pub check_id: &'a str,
    pub name: &'a str,
    pub node: &'a str,
    pub notes: &'a str,
    pub service_name: &'a str,
    pub status: HealthStatus,
}

impl<'a> From<&'a RegistrationRecord> for ConsulRegistration<'a> {
    fn from(record: &'a RegistrationRecord) -> Self {
        let check = &record.health_check;

        Self {
            node: &record.node,
            address: &record.address,
            node_meta: &record.node_metadata,
            service: ConsulService {
                service: &record.service_name,
                tags: &record.tags,
                port: record.port,
                meta: &record.service_metadata,
            },
            checks: vec![ConsulCheck {
                check_id: &check.id,
                name: &check.name,
                node: &check.node,
                notes: &check.notes,
                service_name: &check.service_name,
                status: check.status,
            }],
            skip_node_update: record.skip_node_update,
        }
    }
}
