//! kvlog CLI
//!
//! Command-line interface for reading and writing a kvlog store.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use kvlog::config::{DEFAULT_META_FILE, DEFAULT_STORAGE_FILE};
use kvlog::log::Recovery;
use kvlog::{Config, Engine, SyncPolicy, TailPolicy};
use tracing_subscriber::{fmt, EnvFilter};

/// kvlog CLI
#[derive(Parser, Debug)]
#[command(name = "kvlog-cli")]
#[command(about = "CLI for the kvlog embedded key-value store")]
#[command(version)]
struct Args {
    /// Log file path
    #[arg(short, long, default_value = DEFAULT_STORAGE_FILE)]
    storage: PathBuf,

    /// Meta (checksum) file path
    #[arg(short, long, default_value = DEFAULT_META_FILE)]
    meta: PathBuf,

    /// Refuse to open a log with a truncated or corrupt tail
    #[arg(long)]
    strict_tail: bool,

    /// fsync after every append instead of only on close
    #[arg(long)]
    sync_every_write: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        #[arg(allow_hyphen_values = true)]
        key: i32,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        #[arg(allow_hyphen_values = true)]
        key: i32,

        /// The value to set (UTF-8 text unless --bytes is given)
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Parse the value as a comma-separated list of signed bytes, e.g. 1,-7,42
        #[arg(long)]
        bytes: bool,
    },

    /// Delete a key
    Del {
        /// The key to delete
        #[arg(allow_hyphen_values = true)]
        key: i32,
    },

    /// Scan the log and print recovery statistics without opening the store
    Inspect,

    /// Persist three sample entries, reopen, and read one back
    Demo,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvlog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .storage_path(&args.storage)
        .meta_path(&args.meta)
        .sync_policy(if args.sync_every_write {
            SyncPolicy::EveryWrite
        } else {
            SyncPolicy::OnClose
        })
        .tail_policy(if args.strict_tail {
            TailPolicy::Reject
        } else {
            TailPolicy::Discard
        })
        .build();

    if let Err(e) = run(config, args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(config: Config, command: Commands) -> kvlog::Result<()> {
    match command {
        Commands::Get { key } => {
            let mut engine = Engine::open(config)?;
            match engine.read(key)? {
                Some(value) => println!("{}", format_value(value)),
                None => println!("(absent)"),
            }
            engine.close()
        }
        Commands::Put { key, value, bytes } => {
            let value = if bytes {
                parse_byte_list(&value)?
            } else {
                value.into_bytes()
            };
            let mut engine = Engine::open(config)?;
            engine.persist(key, &value)?;
            engine.close()
        }
        Commands::Del { key } => {
            let mut engine = Engine::open(config)?;
            engine.delete(key)?;
            engine.close()
        }
        Commands::Inspect => {
            let result = Recovery::verify(&config.storage_path)?;
            println!("records:    {}", result.records_replayed);
            println!("inserts:    {}", result.inserts);
            println!("tombstones: {}", result.tombstones);
            println!("live keys:  {}", result.live_keys);
            println!("valid len:  {}", result.valid_len);
            match &result.tail {
                Some(defect) => println!("tail:       {}", defect),
                None => println!("tail:       clean"),
            }
            Ok(())
        }
        Commands::Demo => demo(config),
    }
}

fn demo(config: Config) -> kvlog::Result<()> {
    println!("kvlog checker\n");

    let mut engine = Engine::open(config.clone())?;
    engine.persist(6, &to_bytes(&[1, -7, 42, 3, 8, 1]))?;
    engine.persist(-800, &to_bytes(&[9]))?;
    engine.persist(777, &to_bytes(&[-50, 43, 1, 0, 0, 62, 8]))?;
    engine.close()?;

    let mut engine = Engine::open(config)?;
    match engine.read(-800)? {
        Some(value) => println!("{}", format_value(value)),
        None => println!("(absent)"),
    }
    engine.close()
}

/// Render bytes as a signed list, e.g. `[1, -7, 42]`
fn format_value(value: &[u8]) -> String {
    let signed: Vec<i8> = value.iter().map(|b| *b as i8).collect();
    format!("{:?}", signed)
}

fn to_bytes(signed: &[i8]) -> Vec<u8> {
    signed.iter().map(|b| *b as u8).collect()
}

fn parse_byte_list(input: &str) -> kvlog::Result<Vec<u8>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i8>()
                .map(|b| b as u8)
                .map_err(|e| kvlog::KvError::Config(format!("invalid byte {:?}: {}", s, e)))
        })
        .collect()
}
