// Service catalog sink

mod consul;

pub use consul::{ConsulCatalog, ConsulRegistration};

use crate::error::Result;
use crate::registration::RegistrationRecord;
use async_trait::async_trait;

/// Accepts one registration per eligible service
#[async_trait]
pub trait CatalogSink: Send + Sync {
    async fn register(&self, record: &RegistrationRecord) -> Result<()>;
}
