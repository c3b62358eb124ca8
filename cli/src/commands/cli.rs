use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "cumulus",
    about = "Provision a compute cluster and reach its master node"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CreateArgs {
    /// Variable profile layered over the default variables.
    pub profile: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TailArgs {
    /// Stop once the readiness marker appears in the log.
    #[arg(long, default_value_t = false)]
    pub until_ready: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the cluster and wait until the master node is ready.
    Create(CreateArgs),
    /// Tear the cluster down.
    Destroy,
    /// SSH into the master node.
    Login,
    /// Open the master node's web UI.
    Admin,
    /// Print the cloud-init log from the master node.
    CatCloudinitLog,
    /// Follow the cloud-init log on the master node.
    TailCloudinitLog(TailArgs),
}
