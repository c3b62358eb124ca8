mod load;
mod types;

pub use load::{data_dir, load_default};
pub use types::{
    AppConfig, ClusterConfig, HostKeyChecking, LoggingConfig, SshConfig, TerraformConfig,
};
