use crate::{
    chains::evm::EvmChain,
    config::SwapctlConfig,
    paths::SwapctlPaths,
    store::ConfigStore,
};
use eyre::Context as _;
use serde_json::json;
use std::{path::PathBuf, time::Duration};

const RPC_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

struct ConfigReport {
    path: PathBuf,
    exists: bool,
    parse_ok: bool,
    error: Option<String>,
    chain_name: String,
    chain_id: u64,
    rpc_url: String,
    router: String,
    fee: u32,
    tokens: Vec<String>,
}

struct RpcReport {
    reachable: bool,
    remote_chain_id: Option<u64>,
    block_number: Option<u64>,
    error: Option<String>,
}

impl RpcReport {
    fn chain_id_matches(&self, configured: u64) -> Option<bool> {
        self.remote_chain_id.map(|id| id == configured)
    }
}

struct DoctorReport {
    version: &'static str,
    paths: SwapctlPaths,
    config: ConfigReport,
    rpc: RpcReport,
    env: serde_json::Value,
}

async fn probe_rpc(cfg: &SwapctlConfig) -> RpcReport {
    let failed = |e: String| RpcReport {
        reachable: false,
        remote_chain_id: None,
        block_number: None,
        error: Some(e),
    };
    let chain = match EvmChain::connect(&cfg.chain) {
        Ok(c) => c,
        Err(e) => return failed(format!("{e:#}")),
    };
    let remote_chain_id = match tokio::time::timeout(RPC_PROBE_TIMEOUT, chain.remote_chain_id())
        .await
    {
        Ok(Ok(id)) => id,
        Ok(Err(e)) => return failed(format!("{e:#}")),
        Err(_) => return failed("eth_chainId timed out".to_owned()),
    };
    // Reachability is decided by eth_chainId; the block number is informational.
    let (block_number, error) =
        match tokio::time::timeout(RPC_PROBE_TIMEOUT, chain.block_number()).await {
            Ok(Ok(n)) => (Some(n), None),
            Ok(Err(e)) => (None, Some(format!("{e:#}"))),
            Err(_) => (None, Some("eth_blockNumber timed out".to_owned())),
        };
    RpcReport {
        reachable: true,
        remote_chain_id: Some(remote_chain_id),
        block_number,
        error,
    }
}

async fn collect(paths: SwapctlPaths) -> DoctorReport {
    let store = ConfigStore::new(&paths);
    let exists = store.path().exists();
    let (parse_ok, error, cfg) = match store.load_existing() {
        Ok(Some(cfg)) => match cfg.validate() {
            Ok(()) => (true, None, cfg),
            Err(e) => (false, Some(format!("{e:#}")), cfg),
        },
        Ok(None) => (false, None, ConfigStore::defaults_with_env().unwrap_or_default()),
        Err(e) => (
            false,
            Some(format!("{e:#}")),
            ConfigStore::defaults_with_env().unwrap_or_default(),
        ),
    };

    let rpc = probe_rpc(&cfg).await;

    let env = json!({
      "SWAPCTL_CONFIG_DIR": env_opt("SWAPCTL_CONFIG_DIR"),
      "SWAPCTL_DATA_DIR": env_opt("SWAPCTL_DATA_DIR"),
      "SWAPCTL_RPC_URL": env_opt("SWAPCTL_RPC_URL"),
      "SWAPCTL_CHAIN_ID": env_opt("SWAPCTL_CHAIN_ID"),
      "SWAPCTL_ROUTER_ADDRESS": env_opt("SWAPCTL_ROUTER_ADDRESS"),
      "SWAPCTL_PRIVATE_KEY_set": std::env::var(crate::account::PRIVATE_KEY_ENV).is_ok(),
    });

    DoctorReport {
        version: env!("CARGO_PKG_VERSION"),
        config: ConfigReport {
            path: store.path().to_path_buf(),
            exists,
            parse_ok,
            error,
            chain_name: cfg.chain.name.clone(),
            chain_id: cfg.chain.chain_id,
            rpc_url: cfg.chain.rpc_url.clone(),
            router: cfg.router.address.clone(),
            fee: cfg.router.fee,
            tokens: cfg.tokens.keys().cloned().collect(),
        },
        paths,
        rpc,
        env,
    }
}

fn print_json(out: &mut impl std::io::Write, r: &DoctorReport) -> eyre::Result<()> {
    let s = serde_json::to_string_pretty(&json!({
      "ok": true,
      "version": r.version,
      "paths": r.paths,
      "config": {
        "path": r.config.path,
        "exists": r.config.exists,
        "parse_ok": r.config.parse_ok,
        "error": r.config.error,
        "chain": {
          "name": r.config.chain_name,
          "chain_id": r.config.chain_id,
          "rpc_url": r.config.rpc_url,
        },
        "router": {
          "address": r.config.router,
          "fee": r.config.fee,
        },
        "tokens": r.config.tokens,
      },
      "rpc": {
        "reachable": r.rpc.reachable,
        "chain_id": r.rpc.remote_chain_id,
        "chain_id_matches": r.rpc.chain_id_matches(r.config.chain_id),
        "block_number": r.rpc.block_number,
        "error": r.rpc.error,
      },
      "env": r.env,
      "hints": [
        "Run `swapctl init` to write config.toml, then edit chain.rpc_url and tokens.",
        "Set SWAPCTL_PRIVATE_KEY (or pass --private-key-file) before `swapctl swap`.",
        "Swaps use amountOutMinimum = 0: there is no slippage protection.",
      ]
    }))
    .context("serialize doctor json")?;
    writeln!(out, "{s}").context("write doctor json")?;
    Ok(())
}

fn print_human(out: &mut impl std::io::Write, r: &DoctorReport) -> eyre::Result<()> {
    writeln!(out, "swapctl doctor (v{})", r.version).context("write header")?;
    writeln!(out).context("write newline")?;

    writeln!(out, "Paths:").context("write paths header")?;
    writeln!(out, "  config_dir: {}", r.paths.config_dir.display()).context("write paths")?;
    writeln!(out, "  data_dir:   {}", r.paths.data_dir.display()).context("write paths")?;
    writeln!(out, "  log_file:   {}", r.paths.log_file.display()).context("write paths")?;
    writeln!(out).context("write newline")?;

    writeln!(out, "Config:").context("write config header")?;
    writeln!(out, "  config.toml: {}", r.config.path.display()).context("write config")?;
    if !r.config.exists {
        writeln!(out, "  status: missing (defaults in use; `swapctl init` writes them)")
            .context("write config")?;
    } else if r.config.parse_ok {
        writeln!(out, "  status: ok").context("write config")?;
    } else {
        writeln!(out, "  status: invalid").context("write config")?;
        if let Some(e) = &r.config.error {
            let first = e.lines().next().unwrap_or("parse error");
            writeln!(out, "  error: {first}").context("write config")?;
        }
    }
    writeln!(
        out,
        "  chain: {} (id {}) via {}",
        r.config.chain_name, r.config.chain_id, r.config.rpc_url
    )
    .context("write config")?;
    writeln!(out, "  router: {} fee {}", r.config.router, r.config.fee)
        .context("write config")?;
    writeln!(out, "  tokens: {}", r.config.tokens.join(", ")).context("write config")?;
    writeln!(out).context("write newline")?;

    writeln!(out, "RPC:").context("write rpc header")?;
    writeln!(out, "  reachable: {}", r.rpc.reachable).context("write rpc")?;
    if let Some(id) = r.rpc.remote_chain_id {
        let matches = id == r.config.chain_id;
        writeln!(out, "  chain_id: {id} (matches config: {matches})").context("write rpc")?;
    }
    if let Some(n) = r.rpc.block_number {
        writeln!(out, "  block_number: {n}").context("write rpc")?;
    }
    if let Some(e) = &r.rpc.error {
        writeln!(out, "  error: {e}").context("write rpc")?;
    }
    writeln!(out).context("write newline")?;

    writeln!(out, "Env (redacted):").context("write env header")?;
    writeln!(
        out,
        "  SWAPCTL_RPC_URL: {:?}",
        r.env.get("SWAPCTL_RPC_URL").and_then(|v| v.as_str())
    )
    .context("write env")?;
    writeln!(
        out,
        "  SWAPCTL_PRIVATE_KEY_set: {}",
        r.env
            .get("SWAPCTL_PRIVATE_KEY_set")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    )
    .context("write env")?;
    Ok(())
}

pub async fn run(paths: SwapctlPaths, as_json: bool) -> eyre::Result<()> {
    let report = collect(paths).await;
    let mut out = std::io::stdout().lock();
    if as_json {
        print_json(&mut out, &report)
    } else {
        print_human(&mut out, &report)
    }
}
