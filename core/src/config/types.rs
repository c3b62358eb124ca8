use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ClusterError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub terraform: TerraformConfig,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub cluster: ClusterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            terraform: TerraformConfig::default(),
            ssh: SshConfig::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "cumulus_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformConfig {
    /// Binary used to drive the provisioning backend.
    #[serde(default = "default_terraform_bin")]
    pub bin: String,

    /// State document produced by a provisioning run.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Directory holding `default.tfvars` and `profiles/<name>.tfvars`.
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
}

fn default_terraform_bin() -> String {
    "terraform".to_string()
}

fn default_state_file() -> String {
    "terraform.tfstate".to_string()
}

fn default_config_dir() -> String {
    "cluster".to_string()
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            bin: default_terraform_bin(),
            state_file: default_state_file(),
            config_dir: default_config_dir(),
        }
    }
}

impl TerraformConfig {
    pub fn state_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.state_file).into_owned())
    }

    pub fn default_var_file(&self) -> PathBuf {
        self.config_path().join("default.tfvars")
    }

    pub fn profile_var_file(&self, profile: &str) -> PathBuf {
        self.config_path()
            .join("profiles")
            .join(format!("{profile}.tfvars"))
    }

    fn config_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.config_dir).into_owned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// Login user on the master node.
    #[serde(default = "default_ssh_username")]
    pub username: String,

    /// Timeout for the connection handshake. The follow stream itself is
    /// unbounded; callers needing a bounded wait impose their own timeout.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Host key verification policy passed through to ssh.
    #[serde(default)]
    pub host_key_checking: HostKeyChecking,
}

fn default_ssh_username() -> String {
    "ubuntu".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    180
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            username: default_ssh_username(),
            connect_timeout_secs: default_connect_timeout_secs(),
            host_key_checking: HostKeyChecking::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyChecking {
    /// Refuse hosts that are not already in known_hosts.
    Strict,
    /// Accept keys from unknown hosts, refuse changed keys.
    #[default]
    AcceptNew,
    /// No verification. Not recommended outside throwaway clusters.
    Off,
}

impl HostKeyChecking {
    /// Value for ssh's `StrictHostKeyChecking` option.
    pub fn ssh_option(self) -> &'static str {
        match self {
            HostKeyChecking::Strict => "yes",
            HostKeyChecking::AcceptNew => "accept-new",
            HostKeyChecking::Off => "no",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Output key in the state document holding the master node address.
    #[serde(default = "default_master_addr_key")]
    pub master_addr_key: String,

    #[serde(default = "default_cloudinit_log_path")]
    pub cloudinit_log_path: String,

    #[serde(default = "default_web_ui_port")]
    pub web_ui_port: u16,

    /// Log line marking the end of remote initialization.
    #[serde(default = "default_ready_pattern")]
    pub ready_pattern: String,
}

fn default_master_addr_key() -> String {
    "master_dns".to_string()
}

fn default_cloudinit_log_path() -> String {
    "/var/log/cloud-init-output.log".to_string()
}

fn default_web_ui_port() -> u16 {
    8080
}

fn default_ready_pattern() -> String {
    "Cloud-init .* finished".to_string()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            master_addr_key: default_master_addr_key(),
            cloudinit_log_path: default_cloudinit_log_path(),
            web_ui_port: default_web_ui_port(),
            ready_pattern: default_ready_pattern(),
        }
    }
}

impl ClusterConfig {
    pub fn ready_regex(&self) -> Result<Regex, ClusterError> {
        Regex::new(&self.ready_pattern)
            .map_err(|e| ClusterError::Config(format!("invalid ready_pattern: {e}")))
    }
}
