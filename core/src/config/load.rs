use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default cumulus data directory: ~/.cumulus
pub fn data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".cumulus"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.cumulus/config.toml (highest)
    let data = data_dir()?;
    let user_config = data.join("config.toml");

    // Priority 2: ./cumulus.toml (current directory)
    let local_config = Path::new("cumulus.toml");

    let mut cfg: AppConfig = if user_config.exists() {
        let s = std::fs::read_to_string(&user_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    // Default the log directory into the data dir so the tool behaves the
    // same from any working directory.
    if cfg
        .logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .is_none()
    {
        let logs_dir = data.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    // Environment variable overrides (Priority 0: highest)
    if let Ok(v) = std::env::var("CUMULUS_SSH_USER") {
        if !v.trim().is_empty() {
            cfg.ssh.username = v;
        }
    }
    if let Ok(v) = std::env::var("CUMULUS_TERRAFORM_BIN") {
        if !v.trim().is_empty() {
            cfg.terraform.bin = v;
        }
    }
    if let Ok(v) = std::env::var("CUMULUS_STATE_FILE") {
        if !v.trim().is_empty() {
            cfg.terraform.state_file = v;
        }
    }

    Ok(cfg)
}
