use crate::{config::SwapctlConfig, paths::SwapctlPaths};
use eyre::Context as _;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

/// Apply `SWAPCTL_*` environment overrides on top of the file config.
fn apply_env_overrides(cfg: &mut SwapctlConfig) -> eyre::Result<()> {
    /// If `var` is set and non-empty, pass its trimmed value to `setter`.
    fn apply_env(
        var: &str,
        setter: impl FnOnce(&str) -> eyre::Result<()>,
    ) -> eyre::Result<()> {
        if let Ok(u) = std::env::var(var) {
            let t = u.trim();
            if !t.is_empty() {
                setter(t).with_context(|| format!("{var}={t}"))?;
            }
        }
        Ok(())
    }

    apply_env("SWAPCTL_RPC_URL", |v| {
        v.clone_into(&mut cfg.chain.rpc_url);
        Ok(())
    })?;
    apply_env("SWAPCTL_CHAIN_ID", |v| {
        cfg.chain.chain_id = v.parse().context("parse chain id")?;
        Ok(())
    })?;
    apply_env("SWAPCTL_ROUTER_ADDRESS", |v| {
        v.clone_into(&mut cfg.router.address);
        Ok(())
    })?;
    apply_env("SWAPCTL_SENDER", |v| {
        cfg.sender = Some(v.to_owned());
        Ok(())
    })?;
    apply_env("SWAPCTL_RECEIPT_TIMEOUT_SECONDS", |v| {
        cfg.receipt.timeout_seconds = v.parse().context("parse seconds")?;
        Ok(())
    })?;
    Ok(())
}

impl ConfigStore {
    pub fn new(paths: &SwapctlPaths) -> Self {
        Self {
            path: paths.config_file.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse `config.toml` with env overrides applied, without creating it. `None` if missing.
    pub fn load_existing(&self) -> eyre::Result<Option<SwapctlConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&self.path).context("read config.toml")?;
        let mut cfg: SwapctlConfig = toml::from_str(&s).context("parse config.toml")?;
        apply_env_overrides(&mut cfg)?;
        Ok(Some(cfg))
    }

    /// Built-in defaults with env overrides applied.
    pub fn defaults_with_env() -> eyre::Result<SwapctlConfig> {
        let mut cfg = SwapctlConfig::default();
        apply_env_overrides(&mut cfg)?;
        Ok(cfg)
    }

    /// Read `config.toml` (writing the defaults on first run), then apply env overrides.
    pub fn load_or_init_default(&self) -> eyre::Result<SwapctlConfig> {
        let cfg = if let Some(cfg) = self.load_existing()? {
            cfg
        } else {
            self.save(&SwapctlConfig::default())?;
            Self::defaults_with_env()?
        };
        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }

    pub fn save(&self, cfg: &SwapctlConfig) -> eyre::Result<()> {
        let s = toml::to_string_pretty(cfg).context("serialize config.toml")?;
        crate::fsutil::write_private_atomic(&self.path, &s).context("write config.toml")
    }
}
