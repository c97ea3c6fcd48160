//! seglog CLI
//!
//! Command-line interface for working with a seglog data directory
//! directly, without a server in front of it.

use clap::{Parser, Subcommand};
use seglog::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// seglog CLI
#[derive(Parser, Debug)]
#[command(name = "seglog")]
#[command(about = "Durable key-value store with a segmented value log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./seglog_data")]
    data_dir: String,

    /// Soft segment capacity in MB
    #[arg(short = 's', long, default_value = "64")]
    segment_mb: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the value stored under a key
    Get {
        /// The key to look up
        key: String,
    },

    /// Store a value under a key
    Put {
        /// The key to store under (must not contain whitespace)
        key: String,

        /// The value to store
        value: String,
    },

    /// Look up a numeric location
    GetNumber {
        /// The key to look up
        key: String,
    },

    /// Record a numeric location under a key
    PutNumber {
        /// The key to store under (must not contain whitespace)
        key: String,

        /// The location value
        location: u64,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,seglog=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .segment_max_size(args.segment_mb * 1024 * 1024)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let result = run(&engine, &args.command);

    // Close syncs and compacts, so a successful exit confirms the write
    if let Err(e) = result.and_then(|_| engine.close()) {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

fn run(engine: &Engine, command: &Commands) -> seglog::Result<()> {
    match command {
        Commands::Get { key } => {
            match engine.get(key.as_bytes())? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("(not found)"),
            }
        }
        Commands::Put { key, value } => {
            engine.put(key.as_bytes(), value.as_bytes())?;
        }
        Commands::GetNumber { key } => {
            match engine.get_number(key.as_bytes()) {
                Some(location) => println!("{location}"),
                None => println!("(not found)"),
            }
        }
        Commands::PutNumber { key, location } => {
            engine.put_number(key.as_bytes(), *location)?;
        }
    }
    Ok(())
}
