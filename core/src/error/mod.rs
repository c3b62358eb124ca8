mod error;

pub use error::{CliError, ClusterError};
