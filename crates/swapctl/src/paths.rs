use directories::ProjectDirs;
use eyre::ContextCompat as _;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct SwapctlPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub log_file: PathBuf,
}

impl SwapctlPaths {
    fn from_dirs(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_file: config_dir.join("config.toml"),
            log_file: data_dir.join("swapctl.log.jsonl"),
            config_dir,
            data_dir,
        }
    }

    pub fn discover() -> eyre::Result<Self> {
        // Test/CI override knobs; both must be set.
        if let (Ok(data_dir), Ok(config_dir)) = (
            std::env::var("SWAPCTL_DATA_DIR"),
            std::env::var("SWAPCTL_CONFIG_DIR"),
        ) {
            return Ok(Self::from_dirs(config_dir.into(), data_dir.into()));
        }

        // macOS: ~/Library/Application Support/swapctl
        // Linux: ~/.config/swapctl and ~/.local/share/swapctl
        let proj =
            ProjectDirs::from("", "", "swapctl").context("failed to resolve project dirs")?;
        Ok(Self::from_dirs(
            proj.config_dir().to_path_buf(),
            proj.data_dir().to_path_buf(),
        ))
    }

    pub fn ensure_private_dirs(&self) -> eyre::Result<()> {
        crate::fsutil::ensure_private_dir(&self.config_dir)?;
        crate::fsutil::ensure_private_dir(&self.data_dir)?;
        Ok(())
    }
}
