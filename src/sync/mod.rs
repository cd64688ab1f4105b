// Polling cycle: discovery → identity → filtering → tag rendering → registration
//
// Faults are isolated per item. A resource that cannot become an identity is
// skipped, a failed registration is logged, and the loop outlives any single
// failed cycle.

mod signals;

pub use signals::{LoopSignal, SignalHandler};

use crate::catalog::CatalogSink;
use crate::config::Config;
use crate::discovery::DiscoverySource;
use crate::error::Result;
use crate::filtering::FilterSet;
use crate::registration::{self, RegistrationPolicy, RegistrationRecord};
use crate::service::ServiceIdentity;
use crate::templating::{TagMode, TemplateRenderer};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time;

/// Per-cycle settings
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
    pub region: String,
    pub filters: Vec<String>,
    pub exclusions: Vec<String>,
    pub tag_templates: Vec<String>,
    pub tag_mode: TagMode,
    pub policy: RegistrationPolicy,
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            region: config.aws.region.clone(),
            filters: config.sync.filters.clone(),
            exclusions: config.sync.exclusions.clone(),
            tag_templates: config.sync.tags.clone(),
            tag_mode: config.sync.tag_mode(),
            policy: config.registration.policy(),
        }
    }
}

/// Statistics from one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Resources listed by discovery
    pub discovered: usize,
    /// Resources that could not become a service identity
    pub skipped: usize,
    /// Services left after filtering
    pub eligible: usize,
    pub registered: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

/// Runs polling cycles against a discovery source and a catalog sink
pub struct Syncer {
    discovery: Box<dyn DiscoverySource>,
    catalog: Box<dyn CatalogSink>,
    settings: SyncSettings,
    renderer: TemplateRenderer,
}

impl Syncer {
    pub fn new(
        discovery: Box<dyn DiscoverySource>,
        catalog: Box<dyn CatalogSink>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            discovery,
            catalog,
            settings,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Discover, filter and build this cycle's registrations without registering
    pub async fn plan(&self) -> Result<(Vec<RegistrationRecord>, CycleReport)> {
        let resources = self.discovery.discover().await?;

        let mut report = CycleReport {
            discovered: resources.len(),
            ..Default::default()
        };

        let mut services = Vec::with_capacity(resources.len());
        for resource in resources {
            match ServiceIdentity::new(resource, self.settings.region.as_str()) {
                Ok(service) => {
                    tracing::info!(
                        service_id = service.resource_id(),
                        service = %service.canonical_name(),
                        stage_names = ?service.stage_names(),
                        tags = ?service.sanitized_tag_map(),
                        "RestAPI"
                    );
                    services.push(service);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping resource");
                    report.skipped += 1;
                }
            }
        }

        let candidates = services.len();
        let filters = FilterSet::new(&self.settings.filters, &self.settings.exclusions);
        let eligible = filters.apply(services);
        report.eligible = eligible.len();

        tracing::info!(
            candidates,
            remaining = report.eligible,
            "Filtered services"
        );

        let records = eligible
            .iter()
            .map(|service| {
                let tags = self.renderer.render_tags(
                    &self.settings.tag_templates,
                    service,
                    self.settings.tag_mode,
                );
                registration::build(service, tags, &self.settings.policy)
            })
            .collect();

        Ok((records, report))
    }

    /// Run one full cycle
    ///
    /// Only a discovery failure is returned as an error; registration faults
    /// are counted in the report.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let start = Instant::now();
        let (records, mut report) = self.plan().await?;

        for record in &records {
            tracing::info!(
                service = %record.service_name,
                address = %record.address,
                "Registering service"
            );

            match self.catalog.register(record).await {
                Ok(()) => report.registered += 1,
                Err(e) => {
                    tracing::error!(
                        service = %record.service_name,
                        metadata = ?record.service_metadata,
                        error = %e,
                        "Failed to register"
                    );
                    report.failed += 1;
                }
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Poll until a shutdown signal arrives
    ///
    /// Signals are only acted on between cycles. SIGUSR1 cuts the current
    /// pause short.
    pub async fn run(&self, interval: Duration) -> Result<()> {
        let mut signal_handler = SignalHandler::new()?;

        tracing::info!(interval_secs = interval.as_secs(), "Starting gateway watch");

        loop {
            match self.run_cycle().await {
                Ok(report) => tracing::info!(
                    discovered = report.discovered,
                    skipped = report.skipped,
                    eligible = report.eligible,
                    registered = report.registered,
                    failed = report.failed,
                    elapsed_ms = report.elapsed_ms,
                    "Cycle complete"
                ),
                Err(e) => tracing::error!(error = %e, "Cycle failed"),
            }

            tracing::debug!(time = ?interval, "Sleeping");

            tokio::select! {
                _ = time::sleep(interval) => {}
                sig = signal_handler.wait() => match sig {
                    LoopSignal::Stop(name) => {
                        tracing::info!(signal = name, "Shutdown signal received");
                        break;
                    }
                    LoopSignal::SyncNow => tracing::info!("Immediate sync requested"),
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::StaticDiscovery;
    use crate::error::SyncError;
    use crate::service::RawResource;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingCatalog {
        records: Arc<Mutex<Vec<RegistrationRecord>>>,
        reject: Option<String>,
    }

    #[async_trait]
    impl CatalogSink for RecordingCatalog {
        async fn register(&self, record: &RegistrationRecord) -> Result<()> {
            if self.reject.as_deref() == Some(record.service_name.as_str()) {
                return Err(SyncError::Catalog("rejected".to_string()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn resources() -> Vec<RawResource> {
        vec![
            RawResource::new("a1", "dev-orders")
                .with_tag("STAGE", "dev")
                .with_tag("env", "dev"),
            RawResource::new("b2", "prod-orders")
                .with_tag("STAGE", "prod")
                .with_tag("env", "prod"),
            RawResource {
                resource_id: Some("c3".to_string()),
                ..Default::default()
            },
            RawResource::new("d4", "dev-billing")
                .with_tag("STAGE", "dev")
                .with_tag("env", "dev"),
        ]
    }

    fn settings() -> SyncSettings {
        SyncSettings {
            region: "us-west-2".to_string(),
            filters: vec!["Name=tag:env,Values=^dev$".to_string()],
            tag_templates: vec!["stage={{Tags.STAGE}}".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_cycle_registers_eligible() {
        let catalog = RecordingCatalog::default();
        let syncer = Syncer::new(
            Box::new(StaticDiscovery::new(resources())),
            Box::new(catalog.clone()),
            settings(),
        );

        let report = syncer.run_cycle().await.unwrap();
        assert_eq!(report.discovered, 4);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.eligible, 2);
        assert_eq!(report.registered, 2);
        assert_eq!(report.failed, 0);

        let records = catalog.records.lock().unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.service_name.as_str()).collect();
        assert_eq!(names, vec!["orders", "billing"]);
        assert_eq!(records[0].tags, vec!["stage=dev"]);
        assert_eq!(records[0].address, "a1.execute-api.us-west-2.amazonaws.com");
    }

    #[tokio::test]
    async fn test_sink_fault_does_not_abort_cycle() {
        let catalog = RecordingCatalog {
            reject: Some("orders".to_string()),
            ..Default::default()
        };
        let syncer = Syncer::new(
            Box::new(StaticDiscovery::new(resources())),
            Box::new(catalog.clone()),
            settings(),
        );

        let report = syncer.run_cycle().await.unwrap();
        assert_eq!(report.registered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(catalog.records.lock().unwrap()[0].service_name, "billing");
    }

    #[tokio::test]
    async fn test_plan_strict_tag_mode() {
        let mut settings = settings();
        settings.tag_mode = TagMode::Strict;
        settings.tag_templates.push("{{Tags.owner}}".to_string());

        let syncer = Syncer::new(
            Box::new(StaticDiscovery::new(resources())),
            Box::new(RecordingCatalog::default()),
            settings,
        );

        let (records, _) = syncer.plan().await.unwrap();
        assert_eq!(records[0].tags, vec!["stage=dev", ""]);
    }
}
