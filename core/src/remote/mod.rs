mod follow;
mod pump;
mod ssh;
mod traits;

pub use follow::{read_remote_file, read_session, LogFollower};
pub use ssh::{SshClient, SshSession};
pub use traits::{RemoteExit, RemoteSession};
