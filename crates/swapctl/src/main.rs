#![expect(
    clippy::multiple_crate_versions,
    reason = "transitive dependency duplication"
)]

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use eyre::Context as _;
use serde_json::json;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::prelude::*;

mod account;
mod amount;
mod approval;
mod chains;
mod cli_output;
mod config;
mod doctor;
mod errors;
mod fsutil;
mod paths;
mod store;
mod swap;
mod tx;

use crate::{
    account::Account,
    chains::{erc20, evm::EvmChain},
    config::SwapctlConfig,
    swap::{SwapRequest, SwapSettings, Swapper},
};

#[derive(Parser, Debug)]
#[command(name = "swapctl", version)]
struct Cli {
    /// Read the signing key from this file instead of `SWAPCTL_PRIVATE_KEY`.
    #[arg(long, global = true)]
    private_key_file: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Swap an exact input amount through the configured router.
    ///
    /// Approves the router for exactly the input amount first when the current allowance
    /// differs. The minimum output is zero: there is no slippage protection.
    Swap {
        /// Input token: configured symbol or address.
        #[arg(long)]
        token_in: String,
        /// Output token: configured symbol or address.
        #[arg(long)]
        token_out: String,
        /// Human quantity of the input token, e.g. `0.00008`.
        #[arg(long)]
        amount: String,
    },

    /// Print the account's balance of a token.
    Balance {
        #[arg(long)]
        token: String,
        /// Query this address instead of the signing account.
        #[arg(long)]
        owner: Option<String>,
    },

    /// Print the router's current allowance from the account on a token.
    Allowance {
        #[arg(long)]
        token: String,
        #[arg(long)]
        owner: Option<String>,
    },

    /// Print a quick self-diagnostic report (safe to paste; contains no secrets).
    Doctor {
        /// Emit JSON to stdout (machine-readable).
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Write the default config.toml.
    Init {
        /// Overwrite an existing config.toml.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Print resolved paths (useful for debugging).
    Paths,
}

fn init_logging(paths: &paths::SwapctlPaths) -> tracing_appender::non_blocking::WorkerGuard {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let file_name = paths
        .log_file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("swapctl.log.jsonl");
    let file_appender = tracing_appender::rolling::never(&paths.data_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone());
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn parse_owner(raw: &str) -> eyre::Result<Address> {
    raw.trim()
        .parse()
        .with_context(|| format!("invalid owner address: {raw}"))
}

/// `--owner`, else the configured sender, else the signing key's address.
fn resolve_owner(
    cfg: &SwapctlConfig,
    explicit: Option<&str>,
    key_file: Option<&std::path::Path>,
) -> eyre::Result<Address> {
    if let Some(raw) = explicit {
        return parse_owner(raw);
    }
    if let Some(sender) = cfg.sender_address()? {
        return Ok(sender);
    }
    Ok(Account::load(key_file)?.address())
}

async fn run_swap(
    cfg: &SwapctlConfig,
    key_file: Option<&std::path::Path>,
    token_in: &str,
    token_out: &str,
    quantity: &str,
) -> eyre::Result<()> {
    let account = Account::load(key_file)?;
    account.check_sender(cfg.sender_address()?)?;
    let chain = EvmChain::connect(&cfg.chain)?;
    let settings = SwapSettings {
        router: cfg.router_address()?,
        fee: cfg.router.fee,
        deadline_seconds: cfg.router.deadline_seconds,
        wait: cfg.receipt_wait(),
        explorer_tx_url: cfg.chain.explorer_tx_url.clone(),
    };

    let resolved = cfg
        .resolve_token(token_in)
        .and_then(|a| cfg.resolve_token(token_out).map(|b| (a, b)));
    let result = match resolved {
        Ok((token_in, token_out)) => {
            cli_output::print_no_slippage_warning();
            Swapper::new(&chain, &account, &settings)
                .swap(SwapRequest {
                    token_in,
                    token_out,
                    quantity,
                })
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            cli_output::print_swap_summary(&outcome);
            cli_output::print_json(&cli_output::swap_outcome_json(&outcome))
        }
        Err(e) => {
            error!(code = e.code(), error = %e, "swap failed");
            cli_output::print_json(&cli_output::swap_error_json(&e))?;
            Err(eyre::Report::new(e)).context("swap failed")
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let paths = paths::SwapctlPaths::discover()?;
    std::fs::create_dir_all(&paths.data_dir).context("create data dir")?;
    let _log_guard = init_logging(&paths);
    let key_file = cli.private_key_file.as_deref();
    let store = store::ConfigStore::new(&paths);

    match cli.cmd {
        Command::Swap {
            token_in,
            token_out,
            amount,
        } => {
            let cfg = store.load_or_init_default()?;
            run_swap(&cfg, key_file, &token_in, &token_out, &amount).await
        }
        Command::Balance { token, owner } => {
            let cfg = store.load_or_init_default()?;
            let token = cfg.resolve_token(&token)?;
            let owner = resolve_owner(&cfg, owner.as_deref(), key_file)?;
            let chain = EvmChain::connect(&cfg.chain)?;
            let (balance, decimals) = erc20::balance_and_decimals(&chain, token, owner)
                .await
                .context("read balance")?;
            cli_output::print_json(&json!({
                "token": token.to_checksum(None),
                "owner": owner.to_checksum(None),
                "balance": balance.to_string(),
                "decimals": decimals,
                "formatted": amount::format_base_units(balance, decimals)?,
            }))
        }
        Command::Allowance { token, owner } => {
            let cfg = store.load_or_init_default()?;
            let token = cfg.resolve_token(&token)?;
            let owner = resolve_owner(&cfg, owner.as_deref(), key_file)?;
            let router = cfg.router_address()?;
            let chain = EvmChain::connect(&cfg.chain)?;
            let allowance = erc20::allowance(&chain, token, owner, router)
                .await
                .context("read allowance")?;
            cli_output::print_json(&json!({
                "token": token.to_checksum(None),
                "owner": owner.to_checksum(None),
                "spender": router.to_checksum(None),
                "allowance": allowance.to_string(),
            }))
        }
        Command::Doctor { json } => doctor::run(paths, json).await.context("doctor failed"),
        Command::Init { force } => {
            if store.path().exists() && !force {
                eyre::bail!(
                    "{} already exists (pass --force to overwrite)",
                    store.path().display()
                );
            }
            paths.ensure_private_dirs()?;
            store.save(&SwapctlConfig::default())?;
            cli_output::print_json(&json!({ "config_file": store.path() }))
        }
        Command::Paths => cli_output::print_json(&serde_json::to_value(&paths)?),
    }
}
