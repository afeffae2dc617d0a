//! CellKV CLI
//!
//! Command-line interface for a store kept in a single file.

use std::path::PathBuf;
use std::process::ExitCode;

use cellkv::backup::Backup;
use cellkv::{Config, FileMedium, Result, Status, Store};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// CellKV CLI
#[derive(Parser, Debug)]
#[command(name = "cellkv")]
#[command(about = "Log-structured key-value store in a fixed-size file")]
#[command(version)]
struct Args {
    /// Medium file
    #[arg(short, long, default_value = "./store.txt")]
    file: PathBuf,

    /// Medium capacity in bytes
    #[arg(short, long, default_value = "10240")]
    capacity: usize,

    /// Bytes at the end of the medium that inserts never use
    #[arg(short = 'm', long, default_value = "5")]
    safety_margin: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Erase every record
    Format,

    /// Get a value by key
    Get {
        /// The key to get
        key: String,

        /// Printed when the key is missing
        #[arg(short, long, default_value = "")]
        default: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Check whether a key exists
    Exists {
        /// The key to look up
        key: String,
    },

    /// Print the raw log, tombstones included
    Dump,

    /// Compact the log now
    Optimize,

    /// Print capacity and usage
    Stats,

    /// Save the live pairs to a snapshot file
    Backup {
        /// Snapshot path
        path: PathBuf,
    },

    /// Format the store and reload a snapshot file
    Restore {
        /// Snapshot path
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cellkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("CellKV v{}", cellkv::VERSION);

    let result = run(args);
    if let Err(e) = &result {
        tracing::error!("{}", e);
    }

    match Status::of(&result) {
        Status::Success => ExitCode::SUCCESS,
        Status::Failure => ExitCode::from(1),
        Status::MemFull => ExitCode::from(2),
    }
}

fn run(args: Args) -> Result<()> {
    // Build config from args
    let config = Config::builder()
        .safety_margin(args.safety_margin)
        .max_capacity(FileMedium::MAX_CAPACITY)
        .build();

    let medium = FileMedium::open_with_create_dirs(&args.file, args.capacity)?;
    let mut store = Store::with_config(medium, config);
    store.begin()?;

    match args.command {
        Commands::Format => store.format()?,
        Commands::Get { key, default } => println!("{}", store.get(&key, &default)?),
        Commands::Set { key, value } => store.insert(&key, &value)?,
        Commands::Del { key } => store.remove(&key)?,
        Commands::Exists { key } => println!("{}", store.exists(&key)?),
        Commands::Dump => print!("{}", String::from_utf8_lossy(&store.get_all()?)),
        Commands::Optimize => {
            let report = store.optimize()?;
            println!(
                "kept {} records, dropped {}, reclaimed {} bytes",
                report.records_kept,
                report.records_dropped,
                report.reclaimed()
            );
        }
        Commands::Stats => {
            let used = store.used_bytes()?;
            println!("capacity: {}", store.capacity());
            println!("used:     {}", used);
            println!("free:     {}", store.capacity().saturating_sub(used));
            println!("live:     {}", store.entries()?.len());
        }
        Commands::Backup { path } => {
            let backup = Backup::capture(&store)?;
            backup.write_to(&path)?;
            println!("saved {} entries to {}", backup.len(), path.display());
        }
        Commands::Restore { path } => {
            let backup = Backup::read_from(&path)?;
            backup.restore_into(&mut store)?;
            println!("restored {} entries", backup.len());
        }
    }

    Ok(())
}
