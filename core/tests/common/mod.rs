use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cumulus_core::remote::{RemoteExit, RemoteSession};
use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream};

/// Scripted stand-in for an ssh transport: stdout replays a fixed set of
/// lines, the probe observes teardown from the outside.
pub struct ScriptedSession {
    stdout: Option<DuplexStream>,
    stderr: Option<DuplexStream>,
    // Writer half of stdout, held open for live sessions. kill() drops it,
    // like the pipe closing when a real child dies.
    hold_open: Option<DuplexStream>,
    exit_code: Option<i32>,
    kills: Arc<AtomicUsize>,
}

pub struct SessionProbe {
    kills: Arc<AtomicUsize>,
}

impl SessionProbe {
    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

/// Session whose stdout replays `lines` and then closes, like a remote
/// command that ran to completion.
pub async fn finite_session(lines: &[&str]) -> (ScriptedSession, SessionProbe) {
    session(lines, false, Some(0), "").await
}

/// Session whose stdout replays `lines` and then stays open, like a live
/// `tail -F` that has gone quiet.
pub async fn live_session(lines: &[&str]) -> (ScriptedSession, SessionProbe) {
    session(lines, true, None, "").await
}

/// Session that failed at the transport level: ssh-style exit 255 with
/// diagnostics on stderr and nothing on stdout.
pub async fn failed_session(stderr_text: &str) -> (ScriptedSession, SessionProbe) {
    session(&[], false, Some(255), stderr_text).await
}

async fn session(
    lines: &[&str],
    stay_open: bool,
    exit_code: Option<i32>,
    stderr_text: &str,
) -> (ScriptedSession, SessionProbe) {
    let (mut out_wr, out_rd) = tokio::io::duplex(64 * 1024);
    for line in lines {
        out_wr.write_all(line.as_bytes()).await.unwrap();
        out_wr.write_all(b"\n").await.unwrap();
    }
    let hold_open = if stay_open {
        Some(out_wr)
    } else {
        drop(out_wr);
        None
    };

    let (mut err_wr, err_rd) = tokio::io::duplex(8 * 1024);
    if !stderr_text.is_empty() {
        err_wr.write_all(stderr_text.as_bytes()).await.unwrap();
    }
    drop(err_wr);

    let kills = Arc::new(AtomicUsize::new(0));
    let session = ScriptedSession {
        stdout: Some(out_rd),
        stderr: Some(err_rd),
        hold_open,
        exit_code,
        kills: kills.clone(),
    };
    (session, SessionProbe { kills })
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn kill(&mut self) -> anyhow::Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.hold_open.take();
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<RemoteExit> {
        Ok(RemoteExit {
            code: self.exit_code,
        })
    }
}
