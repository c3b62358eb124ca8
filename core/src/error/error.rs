use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ClusterError {
    /// State document missing, malformed, or the output key absent. The
    /// underlying reason is logged, never shown to the user.
    #[error("cluster state unreadable - is it provisioned?")]
    StateUnavailable { reason: String },
    #[error("config error: {0}")]
    Config(String),
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("connection to {host} failed: {detail}")]
    Connection { host: String, detail: String },
    #[error("identity of host {host} could not be verified: {detail}")]
    HostUntrusted { host: String, detail: String },
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
}
