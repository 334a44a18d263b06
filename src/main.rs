//! Upstream client CLI
//!
//! Drives the session layer against a running daemon.

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use upstream_client::config::PASSPHRASE_ENV;
use upstream_client::ethereum::{from_base_unit, to_base_unit, ChainProvider};
use upstream_client::notification::{Notification, DEFAULT_CAPACITY};
use upstream_client::proxy::ProxyClient;
use upstream_client::session::Theme;
use upstream_client::{
    Config, Error, Notifications, RemoteData, Result, Session, SessionManager,
};

#[derive(Parser)]
#[command(name = "upstream-client")]
#[command(about = "Session and wallet tooling for the Upstream daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current session
    Session,

    /// Unseal the keystore
    Unseal {
        /// Keystore passphrase (defaults to UPSTREAM_PASSPHRASE)
        #[arg(short, long)]
        passphrase: Option<String>,
    },

    /// Create a new keystore
    CreateKeystore {
        /// Passphrase for the new keystore (defaults to UPSTREAM_PASSPHRASE)
        #[arg(short, long)]
        passphrase: Option<String>,
    },

    /// Manage seed addresses
    Seeds {
        #[command(subcommand)]
        command: SeedCommands,
    },

    /// Hide the remote helper hint
    DismissHint,

    /// Change the UI theme (dark, light, h4x0r)
    Theme { theme: Theme },

    /// Convert token amounts
    Units {
        #[command(subcommand)]
        command: UnitCommands,
    },

    /// Query the chain node of the configured environment
    Chain {
        /// Also show the next nonce of this account
        #[arg(long)]
        address: Option<Address>,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum SeedCommands {
    /// List configured seeds
    List,
    /// Validate and add a seed
    Add { seed: String },
    /// Remove a seed
    Remove { seed: String },
}

#[derive(Subcommand)]
enum UnitCommands {
    /// Base units to whole tokens
    ToDisplay { amount: String },
    /// Whole tokens to base units
    FromDisplay { amount: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Units { command } => run_units(command),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Chain { address } => run_chain(&config, address).await,
        command => run_session_command(command, &config).await,
    }
}

fn run_units(command: UnitCommands) -> Result<()> {
    match command {
        UnitCommands::ToDisplay { amount } => {
            let amount = U256::from_str_radix(amount.trim(), 10)
                .map_err(|e| Error::InvalidArgument(format!("Invalid amount {}: {}", amount, e)))?;
            println!("{}", to_base_unit(amount));
        }
        UnitCommands::FromDisplay { amount } => {
            println!("{}", from_base_unit(&amount)?);
        }
    }
    Ok(())
}

async fn run_chain(config: &Config, address: Option<Address>) -> Result<()> {
    let provider = config.chain_provider()?;
    tracing::debug!(environment = %config.environment, rpc_url = %provider.rpc_url(), "Querying chain");

    println!("environment: {}", config.environment);
    println!("chain id: {}", provider.chain_id().await?);
    if let Some(address) = address {
        println!("nonce: {}", provider.transaction_count(address).await?);
    }
    Ok(())
}

fn passphrase(arg: Option<String>) -> Result<SecretString> {
    arg.or_else(|| std::env::var(PASSPHRASE_ENV).ok())
        .map(SecretString::from)
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "No passphrase given and {} is not set",
                PASSPHRASE_ENV
            ))
        })
}

async fn run_session_command(command: Commands, config: &Config) -> Result<()> {
    let daemon = Arc::new(ProxyClient::from_url(&config.proxy_url)?);
    let notifications = Notifications::new(DEFAULT_CAPACITY);
    let logger = spawn_notification_logger(&notifications);

    let result = {
        let manager = SessionManager::new(daemon, notifications, config.retry);
        run_with_session(command, config, &manager).await
    };

    // The manager held the last sender, so the logger stops once drained
    let _ = logger.await;
    result
}

async fn run_with_session(
    command: Commands,
    config: &Config,
    manager: &SessionManager<ProxyClient>,
) -> Result<()> {
    tracing::debug!(proxy_url = %config.proxy_url, "Fetching session");
    manager.fetch().await?;

    match command {
        Commands::Session => print_session(&manager.state())?,
        Commands::Unseal { passphrase: arg } => {
            if manager.unseal(&passphrase(arg)?).await? {
                tracing::info!("Keystore unsealed");
                print_session(&manager.state())?;
            } else {
                tracing::warn!("Incorrect passphrase");
            }
        }
        Commands::CreateKeystore { passphrase: arg } => {
            manager.create_keystore(&passphrase(arg)?).await?;
            tracing::info!("Keystore created");
        }
        Commands::Seeds { command } => match command {
            SeedCommands::List => {
                for seed in &manager.settings().coco.seeds {
                    println!("{}", seed);
                }
            }
            SeedCommands::Add { seed } => {
                if manager.add_seed(&seed).await? {
                    tracing::info!(seed = %seed, "Seed added");
                } else {
                    tracing::warn!(
                        seed = %seed,
                        status = ?manager.seed_validation().status(),
                        "Seed not added"
                    );
                }
            }
            SeedCommands::Remove { seed } => {
                manager.remove_seed(&seed).await?;
                tracing::info!(seed = %seed, "Seed removed");
            }
        },
        Commands::DismissHint => manager.dismiss_remote_helper_hint().await?,
        Commands::Theme { theme } => {
            let mut appearance = manager.settings().appearance;
            appearance.theme = theme;
            manager.update_appearance(appearance).await?;
        }
        Commands::Units { .. } | Commands::Chain { .. } | Commands::Config => {}
    }
    Ok(())
}

fn print_session(state: &RemoteData<Session>) -> Result<()> {
    match state.data() {
        Some(Session::UnsealedSession(unsealed)) => {
            println!("{}", serde_json::to_string_pretty(unsealed)?);
        }
        Some(session) => println!("{:?}", session.status()),
        None => println!("Session not loaded"),
    }
    Ok(())
}

fn spawn_notification_logger(notifications: &Notifications) -> JoinHandle<()> {
    let mut rx = notifications.subscribe();
    tokio::spawn(async move {
        loop {
            let notification = match rx.recv().await {
                Ok(notification) => notification,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification logger fell behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match &notification {
                Notification::Fatal { kind, message, .. } => {
                    tracing::error!(kind = ?kind, "{}", message);
                }
                Notification::Error { id, code, message, .. } => {
                    tracing::warn!(id = %id, code = ?code, "{}", message);
                }
            }
        }
    })
}
