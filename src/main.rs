use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gcpimport::config::Config;
use gcpimport::gcp::auth::validate_project_id;
use gcpimport::gcp::client::{format_gcp_error, GcpClient};
use gcpimport::output::{self, OutputFormat};
use gcpimport::resource::{get_all_family_keys, get_registry, DiscoveryEngine, DiscoveryError};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Discover GCP resources for infrastructure-as-code import
#[derive(Parser, Debug)]
#[command(name = "gcpimport", version = gcpimport::VERSION, about, long_about = None)]
struct Args {
    /// GCP project to discover
    #[arg(short, long)]
    project: Option<String>,

    /// Resource family to discover (repeatable, default: all)
    #[arg(short, long = "family")]
    families: Vec<String>,

    /// Attribute key to strip from every record (repeatable)
    #[arg(long = "ignore-key")]
    ignore_keys: Vec<String>,

    /// Run family collectors concurrently
    #[arg(long)]
    concurrent: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Write records to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Persist the effective project and families to the config file
    #[arg(long)]
    save: bool,

    /// List the available resource families and exit
    #[arg(long)]
    list_families: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcpimport {} started with log level: {:?}", gcpimport::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcpimport").join("gcpimport.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcpimport").join("gcpimport.log");
    }
    PathBuf::from("gcpimport.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level)?;

    if args.list_families {
        let registry = get_registry();
        for key in get_all_family_keys() {
            println!("{:<12} {}", key, registry.families[key].display_name);
        }
        return Ok(());
    }

    if let Err(err) = run(&args).await {
        tracing::error!("Discovery failed: {:#}", err);
        eprintln!("Error: {}", describe_error(&err));
        drop(log_guard);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(args: &Args) -> Result<()> {
    let mut config = Config::load();
    if !args.families.is_empty() {
        config.families = args.families.clone();
    }
    if !args.ignore_keys.is_empty() {
        config.ignore_keys = Some(args.ignore_keys.clone());
    }
    config.concurrent |= args.concurrent;

    let project = config
        .effective_project(args.project.as_deref())
        .context("No GCP project configured. Set GOOGLE_CLOUD_PROJECT or use --project flag")?;

    if !validate_project_id(&project) {
        anyhow::bail!("Invalid GCP project ID: {}", project);
    }

    tracing::info!("Using project: {}", project);

    if args.save {
        config.project_id = Some(project.clone());
        config.save()?;
    }

    let client = GcpClient::new().await?;
    let engine = DiscoveryEngine::new(get_registry());
    let records = engine
        .discover(&client, &config.discovery_config(&project))
        .await?;

    let rendered = output::render(&records, args.format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("Failed to write {:?}", path))?;
            eprintln!("Wrote {} records to {}", records.len(), path.display());
        },
        None => println!("{}", rendered),
    }

    Ok(())
}

/// User-facing error text; listing failures are sanitized
fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<DiscoveryError>() {
        Some(DiscoveryError::Listing { family, kind, source }) => format!(
            "discovery did not complete for family '{}' ({}): {}",
            family,
            kind,
            format_gcp_error(source)
        ),
        Some(other) => other.to_string(),
        None => format!("{:#}", err),
    }
}
