//! Dataset Agent - main entry point.
//!
//! Thin CLI over the library: fetch a manifest's endpoints into the cache,
//! show a cached payload, or probe the upstream status fingerprint.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dataset_agent::config::Settings;
use dataset_agent::fetch::{FetchManager, FetchOutcome};
use dataset_agent::manifest::ApiManifest;
use dataset_agent::retrieve::Table;
use dataset_agent::utils;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one fetch cycle for every endpoint in a manifest
    Fetch {
        /// Manifest file describing the API
        #[arg(short, long, value_name = "FILE")]
        manifest: PathBuf,

        /// Cache directory (overrides the settings file)
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        /// Fetch even when the status fingerprint is unchanged
        #[arg(long)]
        force: bool,
    },
    /// Fetch (honoring the status check), then print one endpoint's payload
    Show {
        /// Manifest file describing the API
        #[arg(short, long, value_name = "FILE")]
        manifest: PathBuf,

        /// Endpoint name to display
        #[arg(short, long)]
        endpoint: String,

        /// Cache directory (overrides the settings file)
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        /// Parse the payload as CSV and print it as a table
        #[arg(long)]
        table: bool,

        /// Comma-separated column subset (implies --table)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },
    /// Probe the status endpoint and print the current fingerprint
    Status {
        /// Manifest file describing the API
        #[arg(short, long, value_name = "FILE")]
        manifest: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    let log_level = args.log_level.as_deref().unwrap_or(&settings.log.level);
    utils::logger::init(log_level);

    tracing::info!("starting dataset-agent v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Fetch {
            manifest,
            base_dir,
            force,
        } => {
            let manifest = ApiManifest::from_file(&manifest)?;
            let base_dir = base_dir.unwrap_or_else(|| settings.cache.base_dir.clone());
            let mut manager = FetchManager::with_http(manifest, base_dir, &settings.http)?;

            match manager.fetch(force).await? {
                FetchOutcome::Completed {
                    endpoints,
                    finished_at,
                } => {
                    println!("fetched {} endpoints at {}", endpoints, finished_at.to_rfc3339());
                    for endpoint in &manager.manifest().endpoints {
                        if let Some(path) = &endpoint.cached {
                            println!("  {} -> {}", endpoint.name, path.display());
                        }
                    }
                }
                FetchOutcome::UpToDate { last_fetch } => match last_fetch {
                    Some(timestamp) => {
                        println!("up to date (last fetch: {})", timestamp.to_rfc3339())
                    }
                    None => println!("up to date"),
                },
            }
        }
        Command::Show {
            manifest,
            endpoint,
            base_dir,
            table,
            columns,
        } => {
            let manifest = ApiManifest::from_file(&manifest)?;
            let base_dir = base_dir.unwrap_or_else(|| settings.cache.base_dir.clone());
            let mut manager = FetchManager::with_http(manifest, base_dir, &settings.http)?;

            // fetch state is process-local, so populate the cache first
            manager.fetch(false).await?;

            if table || columns.is_some() {
                match manager.retrieve_table(&endpoint, columns.as_deref())? {
                    Some(table) => print_table(&table),
                    None => println!("nothing cached for endpoint '{endpoint}'"),
                }
            } else {
                match manager.retrieve_path(&endpoint)? {
                    Some(path) => println!("{}", path.display()),
                    None => println!("nothing cached for endpoint '{endpoint}'"),
                }
            }
        }
        Command::Status { manifest } => {
            let manifest = ApiManifest::from_file(&manifest)?;
            let manager =
                FetchManager::with_http(manifest, settings.cache.base_dir.clone(), &settings.http)?;

            match manager.probe_status().await? {
                Some(fingerprint) => println!("status fingerprint: {fingerprint}"),
                None => println!("manifest declares no status descriptor"),
            }
        }
    }

    Ok(())
}

fn print_table(table: &Table) {
    println!("{}", table.headers.join(","));
    for row in &table.rows {
        println!("{}", row.join(","));
    }
}
