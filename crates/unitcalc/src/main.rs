//! unitcalc - terminal calculator with units
//!
//! Usage:
//!   unitcalc                         # Replay the stored session and continue
//!   unitcalc --fresh                 # Start over with an empty history
//!   unitcalc --engine "numbat-engine"
//!
//! Logs go to `<data_dir>/unitcalc.log`, filtered by `UNITCALC_LOG`.

use clap::Parser as ClapParser;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use unitcalc::config::Config;
use unitcalc::{Options, run};

const LOG_ENV: &str = "UNITCALC_LOG";
const LOG_FILE: &str = "unitcalc.log";

#[derive(ClapParser)]
#[command(name = "unitcalc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal calculator with units and a persistent session", long_about = None)]
struct Args {
    /// Configuration file (default: <config_dir>/unitcalc/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Engine command line, overriding the configuration
    #[arg(long, value_name = "COMMAND")]
    engine: Option<String>,

    /// Directory for the history store and the log file
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Keep history for this session only
    #[arg(long)]
    no_persist: bool,

    /// Clear the stored history instead of replaying it
    #[arg(long)]
    fresh: bool,
}

fn main() {
    let args = Args::parse();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    config.apply_env();
    if let Some(engine) = args.engine {
        config.engine.command = engine;
    }
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = Some(dir);
    }
    if args.no_persist {
        config.storage.persist = false;
    }

    let data_dir = config.data_dir();
    if let Err(e) = init_logging(&data_dir) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    info!(engine = %config.engine.command, data_dir = %data_dir.display(), "starting");

    let options = Options { fresh: args.fresh };
    if let Err(e) = run(config, options) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(dir: &Path) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("{}: {}", dir.display(), e))?;
    let path = dir.join(LOG_FILE);
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("unitcalc=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
