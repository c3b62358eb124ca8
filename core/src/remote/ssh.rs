use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use crate::config::{HostKeyChecking, SshConfig};
use crate::error::ClusterError;

use super::traits::{RemoteExit, RemoteSession};

/// Builds `ssh` invocations against one remote host. Authentication is
/// key- or agent-based; non-interactive commands run with BatchMode so ssh
/// never stops to prompt for a password.
#[derive(Debug, Clone)]
pub struct SshClient {
    host: String,
    cfg: SshConfig,
}

impl SshClient {
    pub fn new(host: impl Into<String>, cfg: SshConfig) -> Self {
        let client = Self {
            host: host.into(),
            cfg,
        };
        if client.cfg.host_key_checking == HostKeyChecking::Off {
            tracing::warn!(host = %client.host, "host key verification is disabled");
        }
        client
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Run `command` on the remote host with piped stdio.
    pub fn exec(&self, command: &str) -> Result<SshSession, ClusterError> {
        let mut cmd = Command::new("ssh");
        cmd.args(self.exec_args(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = cmd
            .spawn()
            .map_err(|e| ClusterError::Spawn(format!("ssh: {e}")))?;
        Ok(SshSession { child })
    }

    /// Interactive shell on the remote host; stdio is inherited and ssh's
    /// exit status is handed back to the caller.
    pub async fn login(&self) -> Result<i32, ClusterError> {
        let status = Command::new("ssh")
            .args(self.login_args())
            .status()
            .await
            .map_err(|e| ClusterError::Spawn(format!("ssh: {e}")))?;
        Ok(status.code().unwrap_or(-1))
    }

    fn common_args(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("ConnectTimeout={}", self.cfg.connect_timeout_secs),
            "-o".to_string(),
            format!(
                "StrictHostKeyChecking={}",
                self.cfg.host_key_checking.ssh_option()
            ),
        ]
    }

    fn exec_args(&self, command: &str) -> Vec<String> {
        let mut args = self.common_args();
        args.push("-o".to_string());
        args.push("BatchMode=yes".to_string());
        args.push("--".to_string());
        args.push(self.destination());
        args.push(command.to_string());
        args
    }

    fn login_args(&self) -> Vec<String> {
        let mut args = self.common_args();
        args.push("--".to_string());
        args.push(self.destination());
        args
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.cfg.username, self.host)
    }
}

pub struct SshSession {
    child: Child,
}

#[async_trait]
impl RemoteSession for SshSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn kill(&mut self) -> anyhow::Result<()> {
        self.child.kill().await?;
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<RemoteExit> {
        let status = self.child.wait().await?;
        Ok(RemoteExit {
            code: status.code(),
        })
    }
}

/// ssh reserves exit status 255 for its own failures (connection, auth, host
/// key). Remote command exit codes pass through untouched.
pub(crate) fn classify_exit(
    host: &str,
    exit: RemoteExit,
    stderr_tail: &str,
) -> Result<(), ClusterError> {
    if exit.code != Some(255) {
        return Ok(());
    }
    let detail = if stderr_tail.trim().is_empty() {
        "connection closed".to_string()
    } else {
        stderr_tail.trim().to_string()
    };
    if detail.contains("Host key verification failed") {
        return Err(ClusterError::HostUntrusted {
            host: host.to_string(),
            detail,
        });
    }
    Err(ClusterError::Connection {
        host: host.to_string(),
        detail,
    })
}
