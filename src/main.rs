//! Leak Sniffer: concurrent domain search across leak collections
//!
//! This is the main entry point for the application.

use anyhow::{bail, Result};
use leak_sniffer::{
    config::{self, Settings},
    results::to_csv,
    search::Search,
    store::StoreLoader,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// What the process was asked to do
enum Command {
    Serve,
    Search(String),
    Help,
    Version,
}

struct Args {
    config: Option<PathBuf>,
    command: Command,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut config = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => match args.next() {
                Some(path) => config = Some(PathBuf::from(path)),
                None => bail!("{} requires a file argument", arg),
            },
            "-h" | "--help" => return Ok(Args { config, command: Command::Help }),
            "-V" | "--version" => return Ok(Args { config, command: Command::Version }),
            _ => positional.push(arg),
        }
    }

    let command = match positional.first().map(String::as_str) {
        None | Some("serve") => Command::Serve,
        Some("search") => Command::Search(positional[1..].join(" ")),
        Some(other) => bail!("Unknown command: {}", other),
    };
    Ok(Args { config, command })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            print_usage();
            std::process::exit(2);
        }
    };

    match args.command {
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Version => {
            println!("leak-sniffer {}", leak_sniffer::VERSION);
            return Ok(());
        }
        _ => {}
    }

    // Load configuration
    let settings = config::load(args.config.as_deref())?;
    init_logging(&settings);

    info!("Starting Leak Sniffer v{}", leak_sniffer::VERSION);

    match args.command {
        Command::Search(domain) => run_search(settings, &domain).await,
        _ => serve(settings).await,
    }
}

/// Initialize logging; RUST_LOG takes precedence over settings
fn init_logging(settings: &Settings) {
    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(settings: Settings) -> Result<()> {
    let store = StoreLoader::open(&settings.store)?;

    // Create application state
    let state = AppState::new(settings.clone(), store)?;
    info!(
        "Searching database '{}' with up to {} workers",
        settings.store.database, settings.search.max_workers
    );

    // Create router
    let app = create_router(state);

    // Bind address
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    info!("Starting server on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run one search and print the normalized table as CSV
async fn run_search(settings: Settings, domain: &str) -> Result<()> {
    let store = StoreLoader::open(&settings.store)?;
    let search = Search::from_settings(store, &settings.search);

    let outcome = match search.search_domain(domain).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_fatal() => {
            error!("{}", e);
            bail!("{}. Please check your store connection and try again.", e);
        }
        Err(e) => bail!("{}", e),
    };

    for fault in outcome.faults() {
        error!("{}", fault);
    }
    if outcome.is_empty() {
        info!("No leaked records found for {}", outcome.query);
    } else {
        info!(
            "Found {} matching records for domain: {}",
            outcome.result_count(),
            outcome.query
        );
    }

    let table = outcome.normalize(&settings.search.column_order);
    print!("{}", to_csv(&table));
    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
Leak Sniffer v{}
Search a domain across every leak collection in a store

USAGE:
    leak-sniffer [OPTIONS] [serve]
    leak-sniffer [OPTIONS] search <DOMAIN>

OPTIONS:
    -c, --config <FILE>    Path to configuration file
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    LEAKSNIFFER_SETTINGS_PATH  Path to settings.yml
    LEAKSNIFFER_DEBUG          Enable debug logging (true/false)
    LEAKSNIFFER_STORE_URI      Store URI (file://<dir> or memory://)
    LEAKSNIFFER_DATABASE       Database name inside the store
    LEAKSNIFFER_MAX_WORKERS    Partitions searched concurrently
    LEAKSNIFFER_PORT           Server port
    LEAKSNIFFER_BIND_ADDRESS   Bind address
    MONGO_URI, DATABASE_NAME, MAX_WORKERS
                               Fallbacks for the store, database and workers
"#,
        leak_sniffer::VERSION
    );
}
