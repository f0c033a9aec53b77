//! `tripkit`: seal and open trip payloads with the device vault key, and poke
//! at the trip helpers from a terminal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use tripkit_core::storage::FileKeyValueStore;
use tripkit_core::trip::{calculate_nights, TravelStyle};
use tripkit_core::vault::EncryptedEnvelope;
use tripkit_core::{Config, Environment, SymmetricVault};

#[derive(Parser, Debug)]
#[command(name = "tripkit", version, about = "Encrypted trip planner toolkit")]
struct Cli {
    /// Directory holding the vault key. Defaults to the platform data dir.
    #[arg(long, env = "TRIPKIT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Deployment whose defaults are used.
    #[arg(long = "env", env = "TRIPKIT_ENV", default_value = "sepolia", global = true)]
    environment: Environment,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seal a JSON payload and print the envelope as 0x-hex.
    Seal {
        /// Payload, as JSON.
        payload: String,
    },
    /// Open a 0x-hex envelope and print the JSON payload.
    Open {
        /// Envelope produced by `seal` or read from the ledger.
        envelope: String,
    },
    /// Count the nights between two YYYY-MM-DD dates.
    Nights {
        /// First day.
        start: String,
        /// Last day.
        end: String,
    },
    /// List the travel styles.
    Styles,
    /// Print the configuration of the selected deployment.
    Config,
}

fn data_dir(cli: &Cli) -> Result<PathBuf> {
    let base = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => dirs::data_dir()
            .ok_or_else(|| eyre!("no platform data directory; pass --data-dir"))?
            .join("tripkit"),
    };
    Ok(base.join(cli.environment.to_string()))
}

fn open_vault(cli: &Cli, config: &Config) -> Result<SymmetricVault> {
    let dir = data_dir(cli)?;
    tracing::debug!(dir = %dir.display(), slot = %config.key_storage_slot, "opening vault");
    let store = FileKeyValueStore::open(&dir)
        .wrap_err_with(|| format!("cannot open key store in {}", dir.display()))?;
    Ok(SymmetricVault::with_slot(
        Arc::new(store),
        config.key_storage_slot.clone(),
    ))
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::from_environment(cli.environment);
    match &cli.command {
        Command::Seal { payload } => {
            let payload: Value =
                serde_json::from_str(payload).wrap_err("payload is not valid JSON")?;
            let envelope = open_vault(cli, &config)?.encrypt(&payload)?;
            println!("{}", envelope.to_hex()?);
        }
        Command::Open { envelope } => {
            let envelope = EncryptedEnvelope::from_hex(envelope)?;
            let payload: Value = open_vault(cli, &config)?.decrypt_envelope(&envelope)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Nights { start, end } => {
            println!("{}", calculate_nights(start, end)?);
        }
        Command::Styles => {
            for style in TravelStyle::all() {
                println!("{} {:<10} {}", style.id(), style.label(), style.description());
            }
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli)
}
