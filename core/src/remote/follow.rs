use std::sync::Arc;

use regex::Regex;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ClusterError;
use crate::util::ByteRing;

use super::pump;
use super::ssh::{self, SshClient};
use super::traits::RemoteSession;

const STDERR_TAIL_BYTES: usize = 4 * 1024;

/// Live tail of a file on a remote host, consumed pull-based one line at a
/// time. The follower owns its session exclusively; teardown runs exactly
/// once, whether the stream ends on its own, a ready marker matches, or the
/// caller cancels with [`close`](LogFollower::close).
pub struct LogFollower {
    session: Box<dyn RemoteSession>,
    host: String,
    line_rx: mpsc::Receiver<String>,
    pump_task: JoinHandle<Result<u64, ClusterError>>,
    stderr_task: Option<JoinHandle<()>>,
    stderr: Arc<ByteRing>,
    closed: bool,
}

impl LogFollower {
    /// Follow `path` on the remote host. The file is replayed from the first
    /// line, and a file that does not exist yet is waited for rather than
    /// failed on (`tail -F`).
    pub fn tail(client: &SshClient, path: &str) -> Result<Self, ClusterError> {
        let session = client.exec(&format!("tail -n +1 -F {path}"))?;
        Self::from_session(Box::new(session), client.host().to_string())
    }

    /// Wrap an already-open session whose stdout is a line stream.
    pub fn from_session(
        mut session: Box<dyn RemoteSession>,
        host: String,
    ) -> Result<Self, ClusterError> {
        let stdout = session
            .stdout()
            .ok_or_else(|| ClusterError::Spawn("remote session has no stdout".to_string()))?;

        let (line_tx, line_rx) = mpsc::channel(pump::LINE_CHANNEL_CAPACITY);
        let pump_task = pump::pump_lines(stdout, line_tx);

        let stderr = ByteRing::new(STDERR_TAIL_BYTES);
        let stderr_task = session
            .stderr()
            .map(|rd| pump::drain_stderr(rd, stderr.clone()));

        Ok(Self {
            session,
            host,
            line_rx,
            pump_task,
            stderr_task,
            stderr,
            closed: false,
        })
    }

    /// Next line from the remote stream, in arrival order. Returns `None`
    /// once the stream has closed, either naturally or via teardown.
    pub async fn next_line(&mut self) -> Result<Option<String>, ClusterError> {
        if self.closed {
            return Ok(None);
        }
        match self.line_rx.recv().await {
            Some(line) => Ok(Some(line)),
            None => self.finish().await,
        }
    }

    /// Follow-until-matched: like [`next_line`](LogFollower::next_line), but
    /// after yielding the first line matching `ready` the session is torn
    /// down and every later call returns `None`.
    pub async fn next_ready_line(&mut self, ready: &Regex) -> Result<Option<String>, ClusterError> {
        match self.next_line().await? {
            Some(line) => {
                if ready.is_match(&line) {
                    self.close().await?;
                }
                Ok(Some(line))
            }
            None => Ok(None),
        }
    }

    /// Tear down the remote session. Idempotent; cancelling consumption at
    /// any point must not leak the remote process.
    pub async fn close(&mut self) -> Result<(), ClusterError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.line_rx.close();
        if let Err(e) = self.session.kill().await {
            tracing::debug!("session kill failed: {e}");
        }
        let _ = self.session.wait().await;

        self.pump_task.abort();
        let _ = (&mut self.pump_task).await;
        if let Some(task) = self.stderr_task.take() {
            task.abort();
            let _ = task.await;
        }
        Ok(())
    }

    /// The stream ended on its own: reap the session and surface transport
    /// failures that produced no output.
    async fn finish(&mut self) -> Result<Option<String>, ClusterError> {
        self.closed = true;

        let pump_res = (&mut self.pump_task).await;
        if let Some(task) = self.stderr_task.take() {
            let _ = task.await;
        }

        let exit = self
            .session
            .wait()
            .await
            .map_err(|e| ClusterError::Connection {
                host: self.host.clone(),
                detail: e.to_string(),
            })?;

        match pump_res {
            Ok(res) => {
                res?;
            }
            Err(e) => tracing::debug!("line pump task failed: {e}"),
        }

        ssh::classify_exit(&self.host, exit, &self.stderr.to_string_lossy())?;
        Ok(None)
    }
}

/// Snapshot of a remote file's current contents, not a live tail.
pub async fn read_remote_file(client: &SshClient, path: &str) -> Result<String, ClusterError> {
    let session = client.exec(&format!("cat {path}"))?;
    read_session(Box::new(session), client.host()).await
}

/// Read a session's full stdout as one string, non-interactively.
pub async fn read_session(
    mut session: Box<dyn RemoteSession>,
    host: &str,
) -> Result<String, ClusterError> {
    let mut stdout = session
        .stdout()
        .ok_or_else(|| ClusterError::Spawn("remote session has no stdout".to_string()))?;

    let stderr = ByteRing::new(STDERR_TAIL_BYTES);
    let stderr_task = session
        .stderr()
        .map(|rd| pump::drain_stderr(rd, stderr.clone()));

    let mut out = Vec::new();
    stdout
        .read_to_end(&mut out)
        .await
        .map_err(|e| ClusterError::StreamIo {
            stream: "stdout",
            source: e,
        })?;

    if let Some(task) = stderr_task {
        let _ = task.await;
    }
    let exit = session.wait().await.map_err(|e| ClusterError::Connection {
        host: host.to_string(),
        detail: e.to_string(),
    })?;
    ssh::classify_exit(host, exit, &stderr.to_string_lossy())?;

    if exit.code.is_some_and(|c| c != 0) {
        tracing::debug!(
            code = exit.code,
            stderr = %stderr.to_string_lossy(),
            "remote read exited non-zero"
        );
    }

    Ok(String::from_utf8_lossy(&out).to_string())
}
