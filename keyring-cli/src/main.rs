//! Developer CLI for the keyring.
//!
//! Runs an [`AccountKeyring`] against a local development key and a JSON
//! state file, so the JSON-RPC surface can be driven from a shell.

mod dev_provider;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::{eyre, WrapErr};
use keyring_core::{
    rpc::{handle_request, JsonRpcCall, OriginPermissions},
    AccountKeyring, AccountOptions, FileStateStore, KeyringConfig, TracingEventSink,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::dev_provider::LocalKeyProvider;

#[derive(Debug, Parser)]
#[command(name = "keyring", version, about = "Drive the keyring against a local development key")]
struct Cli {
    /// Directory holding the keyring state and the development key.
    #[arg(long, env = "KEYRING_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a JSON-RPC call.
    Rpc {
        /// Caller origin; defaults to the host origin.
        #[arg(long)]
        origin: Option<String>,
        /// Method name, e.g. `keyring_listAccounts`.
        method: String,
        /// JSON params.
        params: Option<String>,
    },
    /// Create an account for the development key.
    Create {
        /// Email recorded in the account options.
        #[arg(long)]
        email: Option<String>,
    },
    /// List accounts.
    Accounts,
    /// List queued requests.
    Requests,
    /// Approve a queued request.
    Approve {
        /// Request id.
        id: String,
    },
    /// Reject a queued request.
    Reject {
        /// Request id.
        id: String,
    },
    /// Flip synchronous approvals.
    ToggleSync,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn data_dir(explicit: Option<PathBuf>) -> eyre::Result<PathBuf> {
    explicit
        .or_else(|| dirs::data_dir().map(|dir| dir.join("keyring")))
        .ok_or_else(|| eyre!("no data directory available, pass --data-dir"))
}

fn print_json(value: &Value) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let data_dir = data_dir(cli.data_dir)?;
    let config = KeyringConfig::from_env();
    let provider = Arc::new(LocalKeyProvider::new(data_dir.join("dev-wallet.key")));
    let store = Arc::new(FileStateStore::new(data_dir.join("state.json")));
    let mut keyring = AccountKeyring::init(config, provider, store, Arc::new(TracingEventSink))
        .await
        .wrap_err("initializing keyring")?;

    match cli.command {
        Command::Rpc {
            origin,
            method,
            params,
        } => {
            let params = match params {
                Some(raw) => serde_json::from_str(&raw).wrap_err("params are not valid JSON")?,
                None => Value::Null,
            };
            let origin = origin.unwrap_or_else(|| keyring.config().host_origin.clone());
            let permissions = OriginPermissions::from_config(keyring.config());
            let result = handle_request(
                &mut keyring,
                &permissions,
                &origin,
                &JsonRpcCall::new(method, params),
            )
            .await?;
            print_json(&result)?;
        }
        Command::Create { email } => {
            let created = keyring
                .create_account(AccountOptions {
                    email,
                    ..AccountOptions::default()
                })
                .await?;
            print_json(&created.to_json()?)?;
        }
        Command::Accounts => print_json(&serde_json::to_value(keyring.list_accounts())?)?,
        Command::Requests => print_json(&serde_json::to_value(keyring.list_requests())?)?,
        Command::Approve { id } => print_json(&keyring.approve_request(&id).await?)?,
        Command::Reject { id } => keyring.reject_request(&id, false).await?,
        Command::ToggleSync => {
            let sync = keyring.toggle_sync_approvals().await?;
            println!("synchronous approvals: {sync}");
        }
    }

    Ok(())
}
