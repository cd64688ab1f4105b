// Discovery of gateway resources from the cloud provider

mod api_gateway;

pub use api_gateway::ApiGatewayDiscovery;

use crate::error::Result;
use crate::service::RawResource;
use async_trait::async_trait;

/// Source of raw resource descriptors, listed once per cycle
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// List every resource currently deployed, in provider order
    async fn discover(&self) -> Result<Vec<RawResource>>;
}

/// Fixed list of resources, for dry runs against captured listings and for tests
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    resources: Vec<RawResource>,
}

impl StaticDiscovery {
    pub fn new(resources: Vec<RawResource>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl DiscoverySource for StaticDiscovery {
    async fn discover(&self) -> Result<Vec<RawResource>> {
        Ok(self.resources.clone())
    }
}
