use gateway_sync::catalog::{CatalogSink, ConsulCatalog};
use gateway_sync::cli::{Cli, Commands, ConfigAction, FilterAction, SyncArgs};
use gateway_sync::config::Config;
use gateway_sync::discovery::{ApiGatewayDiscovery, DiscoverySource, StaticDiscovery};
use gateway_sync::error::{Result, SyncError};
use gateway_sync::filtering::Filter;
use gateway_sync::service::RawResource;
use gateway_sync::sync::{SyncSettings, Syncer};
use std::path::{Path, PathBuf};

fn main() {
    let cli = Cli::parse_args();

    init_logging(cli.verbose, cli.log_json);

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "Syncing gateways failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { sync } => cmd_run(cli.config, &sync),
        Commands::Sync {
            sync,
            dry_run,
            resources,
        } => cmd_sync(cli.config, &sync, dry_run, resources),
        Commands::Filter { action } => cmd_filter(action),
        Commands::Config { action } => cmd_config(cli.config, action),
    }
}

fn init_logging(verbose: bool, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose {
        "gateway_sync=debug"
    } else {
        "gateway_sync=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| SyncError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })
}

fn cmd_run(config_path: Option<PathBuf>, args: &SyncArgs) -> Result<()> {
    let config = load_config(config_path, args)?;
    let interval = config
        .sync
        .interval()
        .ok_or_else(|| SyncError::Config(format!("Invalid interval: {}", config.sync.interval)))?;

    tracing::info!(region = %config.aws.region, "Creating api-gateway metadata client");

    runtime()?.block_on(async {
        let discovery = ApiGatewayDiscovery::new(config.aws.region.clone()).await;
        let catalog = consul_catalog(&config)?;
        let syncer = Syncer::new(Box::new(discovery), catalog, SyncSettings::from(&config));
        syncer.run(interval).await
    })
}

fn cmd_sync(
    config_path: Option<PathBuf>,
    args: &SyncArgs,
    dry_run: bool,
    resources: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path, args)?;

    runtime()?.block_on(async {
        let discovery: Box<dyn DiscoverySource> = match resources {
            Some(path) => Box::new(StaticDiscovery::new(read_resources(&path)?)),
            None => Box::new(ApiGatewayDiscovery::new(config.aws.region.clone()).await),
        };
        let catalog = consul_catalog(&config)?;
        let syncer = Syncer::new(discovery, catalog, SyncSettings::from(&config));

        if dry_run {
            let (records, report) = syncer.plan().await?;
            let json = serde_json::to_string_pretty(&records).map_err(|e| SyncError::Json {
                source: e,
                context: "Failed to serialize registrations".to_string(),
            })?;
            println!("{}", json);
            tracing::info!(
                discovered = report.discovered,
                eligible = report.eligible,
                "Dry run complete"
            );
            return Ok(());
        }

        let report = syncer.run_cycle().await?;
        println!(
            "✓ Registered {}/{} services ({} discovered, {} skipped, {} failed)",
            report.registered, report.eligible, report.discovered, report.skipped, report.failed
        );
        Ok::<(), SyncError>(())
    })
}

fn cmd_filter(action: FilterAction) -> Result<()> {
    match action {
        FilterAction::Check { expression } => {
            let filter = Filter::parse(&expression)?;
            filter.compile()?;
            println!("✓ Filter is valid");
            println!("  Tag:     {}", filter.tag_key());
            println!("  Pattern: {}", filter.pattern());
        }
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, &SyncArgs::default())?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| SyncError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| SyncError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, args: &SyncArgs) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        tracing::warn!(
            "Config file not found, using defaults. Run 'gateway-sync config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    args.apply_to(&mut config);
    gateway_sync::config::ConfigValidator::validate(&config)?;

    Ok(config)
}

fn consul_catalog(config: &Config) -> Result<Box<dyn CatalogSink>> {
    let catalog = ConsulCatalog::new(
        config.consul.address.clone(),
        config.consul.datacenter.clone(),
    )?;
    Ok(Box::new(catalog))
}

fn read_resources(path: &Path) -> Result<Vec<RawResource>> {
    let content = std::fs::read_to_string(path).map_err(|e| SyncError::Io {
        source: e,
        context: format!("Failed to read resources file: {:?}", path),
    })?;

    serde_json::from_str(&content).map_err(|e| SyncError::Json {
        source: e,
        context: format!("Failed to parse resources file: {:?}", path),
    })
}
