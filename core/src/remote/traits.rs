use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Exit outcome of a remote command. `code` is `None` when the transport
/// process was killed by a signal.
#[derive(Debug, Clone, Copy)]
pub struct RemoteExit {
    pub code: Option<i32>,
}

/// One remote command execution. A session is exclusively owned for its
/// lifetime; it is not safe to consume the same session from two callers.
#[async_trait]
pub trait RemoteSession: Send {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    async fn kill(&mut self) -> anyhow::Result<()>;
    async fn wait(&mut self) -> anyhow::Result<RemoteExit>;
}
