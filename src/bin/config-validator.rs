//! # Spatial Ingestor Configuration Validator
//!
//! Command-line tool for checking an ingestor configuration file before the
//! orchestrator is wired around it.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use spatial_ingestor::config::{ConfigLoader, ConnectionParams, IngestorConfig};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate spatial ingestor configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON); environment overrides apply on top
    config: PathBuf,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate every setting the orchestrator needs
    Validate,

    /// Print the connection metadata sent with each job
    Metadata,

    /// Show the effective blacklists and target formats
    Admission,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Validate) | None => validate(&cli),
        Some(Commands::Metadata) => show_metadata(&cli),
        Some(Commands::Admission) => show_admission(&cli),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {e:#}");
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> anyhow::Result<std::sync::Arc<IngestorConfig>> {
    ConfigLoader::load(Some(&cli.config))
        .with_context(|| format!("loading {}", cli.config.display()))
}

fn validate(cli: &Cli) -> anyhow::Result<()> {
    println!("🔧 Validating spatial ingestor configuration");
    println!("File: {}", cli.config.display());
    println!();

    let config = load(cli)?;
    println!("✅ Configuration file parsed");

    let issues = config.validate();
    for issue in &issues {
        println!("   ❌ {issue}");
    }
    if !issues.is_empty() {
        bail!("{} configuration issue(s) found", issues.len());
    }

    println!("✅ Microservice: {}", config.microservice_base()?);
    println!("✅ Callback URL: {}", config.callback_url());
    show_connection("PostGIS", config.postgis_url.as_deref())?;
    show_connection("GeoServer", config.internal_geoserver_url.as_deref())?;

    println!("\n🎉 All configuration validation checks passed!");
    Ok(())
}

fn show_connection(label: &str, raw: Option<&str>) -> anyhow::Result<()> {
    let Some(raw) = raw else {
        bail!("{label} connection string is not set");
    };
    let params = ConnectionParams::parse(raw).with_context(|| format!("parsing {label} URL"))?;
    println!(
        "✅ {label}: {}://{}@{}:{}/{}",
        params.db_type, params.db_user, params.db_host, params.db_port, params.db_name
    );
    Ok(())
}

fn show_metadata(cli: &Cli) -> anyhow::Result<()> {
    let config = load(cli)?;
    let metadata = config.microservice_metadata()?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

fn show_admission(cli: &Cli) -> anyhow::Result<()> {
    let config = load(cli)?;
    println!("Auto ingest: {}", config.auto_ingest);
    println!("Target formats: {:?}", config.target_spatial_formats());
    println!("Blacklisted organizations: {:?}", config.blacklists.org);
    println!("Blacklisted packages: {:?}", config.blacklists.pkg);
    println!("Blacklisted users: {:?}", config.blacklists.user);
    Ok(())
}
