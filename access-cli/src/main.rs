//! Access Map CLI
//!
//! Loads the community sheet and the Refuge Restrooms API, merges them, and
//! prints the resulting location list.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use access_aggregator::{AccessConfig, DataService, LoadReport};
use access_cache::CacheStore;
use access_core::{
    AppState, DisplayEntry, FilterSet, LocationRecord, Notification, NotificationLevel,
    ALL_CACHE_KEYS,
};
use access_csv::{extract_last_modified, parse_table};

/// Access Map - community access locations from the sheet and Refuge Restrooms
#[derive(Parser)]
#[command(name = "access-map")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    feeds: FeedArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of `ACCESS_*` variables and `.env`.
#[derive(Args)]
struct FeedArgs {
    /// Community sheet CSV URL
    #[arg(long, global = true)]
    sheet_url: Option<String>,

    /// Blocklist CSV URL; an empty value disables blocking
    #[arg(long, global = true)]
    blocklist_url: Option<String>,

    /// Refuge Restrooms endpoint
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Persist the cache in this directory instead of the user cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Keep the cache in memory for this run only
    #[arg(long, global = true, conflicts_with = "cache_dir")]
    no_cache: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every source and print the merged list
    Load {
        /// Legend filter to apply (food, wifi, public, private); repeatable
        #[arg(short, long = "filter")]
        filters: Vec<String>,
        /// Leave out Refuge Restrooms API locations
        #[arg(long)]
        no_api: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Include entries hidden by the filters
        #[arg(long)]
        all: bool,
    },

    /// Parse a downloaded sheet export
    Parse {
        /// CSV file
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Load and print the blocklist
    Blocklist,

    /// Delete every cached entry
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "access_aggregator=debug,access_sources=debug,access_cache=debug,access_csv=debug,info"
    } else {
        "access_aggregator=info,warn"
    };

    let fmt_layer = if cli.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(fmt_layer)
        .init();

    let config = load_config(&cli.feeds)?;

    match cli.command {
        Commands::Load {
            filters,
            no_api,
            json,
            all,
        } => cmd_load(&config, filters, no_api, json, all).await,
        Commands::Parse { file, json } => cmd_parse(&file, json),
        Commands::Blocklist => cmd_blocklist(&config).await,
        Commands::ClearCache => cmd_clear_cache(&config).await,
    }
}

fn load_config(feeds: &FeedArgs) -> Result<AccessConfig> {
    let mut config = AccessConfig::from_env().context("Invalid ACCESS_* environment")?;

    if let Some(url) = &feeds.sheet_url {
        config = config.with_sheet_url(url);
    }
    if let Some(url) = &feeds.blocklist_url {
        let url = url.trim();
        config = config.with_blocklist_url((!url.is_empty()).then(|| url.to_string()));
    }
    if let Some(url) = &feeds.api_url {
        config = config.with_api_url(url);
    }
    if let Some(dir) = &feeds.cache_dir {
        config = config.with_cache_dir(dir);
    }
    if feeds.no_cache {
        config = config.without_cache_dir();
    }
    if let Some(seconds) = feeds.timeout {
        config = config.with_timeout(seconds);
    }

    config.validate().context("Invalid configuration")?;
    tracing::debug!(?config, "Configuration loaded");
    Ok(config)
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOAD
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct LoadOutput<'a> {
    status: String,
    filters: Vec<String>,
    report: &'a LoadReport,
    notifications: &'a [Notification],
    locations: Vec<&'a DisplayEntry>,
}

/// Load every source and print the display set
async fn cmd_load(
    config: &AccessConfig,
    filters: Vec<String>,
    no_api: bool,
    json: bool,
    all: bool,
) -> Result<()> {
    let cache = Arc::new(config.cache_store());
    let service = DataService::from_config(config, cache).context("Failed to build data service")?;

    let mut state = AppState::new();
    state.show_api_locations = !no_api;
    state.active_filters = FilterSet::from_names(&filters);

    let pb = if json { None } else { Some(spinner("Loading map data...")?) };
    let report = service.load_all(&mut state).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let entries: Vec<&DisplayEntry> = state
        .display
        .entries()
        .iter()
        .filter(|e| all || e.visible)
        .collect();

    if json {
        let output = LoadOutput {
            status: state.status.to_string(),
            filters: state.active_filters.names(),
            report: &report,
            notifications: &state.notifications,
            locations: entries,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let status = state.status.to_string();
    if state.status.is_unavailable() {
        println!("{}", status.red().bold());
    } else {
        println!("{}", status.cyan().bold());
    }

    for note in &state.notifications {
        match note.level {
            NotificationLevel::Error => println!("{} {}", "✗".red(), note.message.red()),
        }
    }

    println!(
        "\n{} {} shown of {} ({} sheet, {} API, {} blocked) · filters: {}",
        "📍".green(),
        report.visible,
        report.displayed,
        report.sheet.records,
        report.api.records,
        report.sheet.blocked + report.api.blocked,
        state.active_filters
    );

    for entry in entries {
        print_record(&entry.record, entry.visible);
    }
    Ok(())
}

fn print_record(record: &LocationRecord, visible: bool) {
    let name = if visible {
        record.location.bold()
    } else {
        record.location.dimmed()
    };
    let origin = if record.is_api_source { " (API)".dimmed().to_string() } else { String::new() };
    let category = format!("[{:?}]", record.category()).to_lowercase();

    println!("\n  {} {}{}", name, category.yellow(), origin);
    if let Some(address) = &record.address {
        println!("     {} {}", "Address:".dimmed(), address);
    }
    if let Some(privacy) = &record.privacy {
        println!("     {} {}", "Privacy:".dimmed(), privacy);
    }
    if record.is_accessible() {
        println!("     {} {}", "Accessibility:".dimmed(), "accessible".green());
    }
    if record.has_restricted_access() {
        if let Some(access) = &record.access {
            println!("     {} {}", "Access:".dimmed(), access.yellow());
        }
    }
    for hours in record.hours_entries() {
        println!("     {} {}", "Hours:".dimmed(), hours);
    }
    if record.coordinates().is_none() {
        println!("     {}", "not on map (no coordinates)".dimmed());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct ParseOutput<'a> {
    last_modified: Option<String>,
    headers: &'a [String],
    rejected: usize,
    records: &'a [LocationRecord],
}

/// Parse a local sheet export
fn cmd_parse(file: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let table = parse_table(&text).with_context(|| format!("{} is not a sheet export", file.display()))?;
    let records = table.records();
    let last_modified = extract_last_modified(&text);

    if json {
        let output = ParseOutput {
            last_modified: last_modified.map(|at| at.to_rfc3339()),
            headers: &table.headers,
            rejected: table.rejected,
            records: &records,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "📄 Parsed:".cyan().bold(), file.display());
    match last_modified {
        Some(at) => println!("   {} {}", "Last modified:".dimmed(), at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("   {} {}", "Last modified:".dimmed(), "unknown".yellow()),
    }
    println!("   {} {}", "Columns:".dimmed(), table.headers.join(", "));
    println!(
        "   {} {} ({} rows rejected)",
        "Records:".dimmed(),
        records.len(),
        table.rejected
    );

    for record in &records {
        print_record(record, true);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCKLIST & CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Load and print the blocklist
async fn cmd_blocklist(config: &AccessConfig) -> Result<()> {
    let cache = Arc::new(config.cache_store());
    let service = DataService::from_config(config, cache).context("Failed to build data service")?;

    let pb = spinner("Loading blocklist...")?;
    let blocklist = service.load_blocklist().await;
    pb.finish_and_clear();

    if blocklist.is_empty() {
        println!("{}", "No blocked locations.".yellow());
        return Ok(());
    }

    println!("{} {} blocked name(s):", "🚫".red(), blocklist.len());
    for name in blocklist.iter() {
        println!("   {}", name);
    }
    Ok(())
}

/// Delete every cached entry
async fn cmd_clear_cache(config: &AccessConfig) -> Result<()> {
    let Some(dir) = &config.cache_dir else {
        println!("{}", "No cache directory configured; nothing to clear.".yellow());
        return Ok(());
    };

    CacheStore::on_disk(dir)
        .clear(&ALL_CACHE_KEYS)
        .await
        .with_context(|| format!("Failed to clear cache in {}", dir.display()))?;

    println!("{} {}", "✅ Cache cleared:".green(), dir.display());
    Ok(())
}
