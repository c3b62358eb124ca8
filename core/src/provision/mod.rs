//! Out-of-process invocation of the provisioning backend. Only the side
//! effect (an updated state document) is consumed; output passes straight
//! through to the operator's terminal.

use std::path::PathBuf;

use tokio::process::Command;

use crate::config::TerraformConfig;
use crate::error::ClusterError;

pub struct Provisioner<'a> {
    cfg: &'a TerraformConfig,
}

impl<'a> Provisioner<'a> {
    pub fn new(cfg: &'a TerraformConfig) -> Self {
        Self { cfg }
    }

    /// `terraform apply` with the default variables, plus the profile's
    /// variables layered on top when one is given.
    pub async fn apply(&self, profile: Option<&str>) -> Result<i32, ClusterError> {
        self.run("apply", var_files(self.cfg, profile)).await
    }

    pub async fn destroy(&self) -> Result<i32, ClusterError> {
        self.run("destroy", var_files(self.cfg, None)).await
    }

    async fn run(&self, action: &str, var_files: Vec<PathBuf>) -> Result<i32, ClusterError> {
        let mut cmd = Command::new(&self.cfg.bin);
        cmd.arg(action);
        for file in &var_files {
            cmd.arg("-var-file").arg(file);
        }

        tracing::info!(bin = %self.cfg.bin, action, "invoking provisioning backend");
        let status = cmd
            .status()
            .await
            .map_err(|e| ClusterError::Spawn(format!("{}: {e}", self.cfg.bin)))?;
        Ok(status.code().unwrap_or(-1))
    }
}

fn var_files(cfg: &TerraformConfig, profile: Option<&str>) -> Vec<PathBuf> {
    let mut files = vec![cfg.default_var_file()];
    if let Some(profile) = profile {
        files.push(cfg.profile_var_file(profile));
    }
    files
}
