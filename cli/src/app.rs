//! Command assembly: each subcommand is a thin composition of core pieces
//! plus external process calls.

use cumulus_core::config::AppConfig;
use cumulus_core::error::{CliError, ClusterError};
use cumulus_core::provision::Provisioner;
use cumulus_core::remote::{read_remote_file, LogFollower, SshClient};
use cumulus_core::state::Cluster;
use regex::Regex;

/// Provision the cluster, then tail the master's cloud-init log until the
/// readiness marker appears.
pub async fn create(cfg: &AppConfig, profile: Option<&str>) -> Result<i32, CliError> {
    let status = Provisioner::new(&cfg.terraform).apply(profile).await?;
    if status != 0 {
        return Ok(status);
    }

    let cluster = Cluster::from_state(cfg)?;
    let client = master_client(cfg, &cluster);
    let ready = cfg.cluster.ready_regex()?;

    tracing::info!(
        host = %cluster.master_addr(),
        log = %cfg.cluster.cloudinit_log_path,
        "waiting for cloud-init to finish on the master node"
    );

    let mut follower = LogFollower::tail(&client, &cfg.cluster.cloudinit_log_path)?;
    while let Some(line) = follower.next_ready_line(&ready).await? {
        println!("{line}");
    }

    tracing::info!("cluster up");
    Ok(0)
}

pub async fn destroy(cfg: &AppConfig) -> Result<i32, CliError> {
    let status = Provisioner::new(&cfg.terraform).destroy().await?;
    Ok(status)
}

pub async fn login(cfg: &AppConfig) -> Result<i32, CliError> {
    let cluster = Cluster::from_state(cfg)?;
    let code = master_client(cfg, &cluster).login().await?;
    Ok(code)
}

pub async fn admin(cfg: &AppConfig) -> Result<i32, CliError> {
    let cluster = Cluster::from_state(cfg)?;
    let url = cluster.web_ui_url();
    tracing::info!(%url, "opening the master web UI");

    let status = opener(&url)
        .status()
        .await
        .map_err(|e| CliError::Command(format!("open {url}: {e}")))?;
    Ok(status.code().unwrap_or(-1))
}

pub async fn cat_cloudinit_log(cfg: &AppConfig) -> Result<i32, CliError> {
    let cluster = Cluster::from_state(cfg)?;
    let client = master_client(cfg, &cluster);
    let contents = read_remote_file(&client, &cfg.cluster.cloudinit_log_path).await?;
    print!("{contents}");
    Ok(0)
}

pub async fn tail_cloudinit_log(cfg: &AppConfig, until_ready: bool) -> Result<i32, CliError> {
    let cluster = Cluster::from_state(cfg)?;
    let client = master_client(cfg, &cluster);
    let ready = if until_ready {
        Some(cfg.cluster.ready_regex()?)
    } else {
        None
    };

    let mut follower = LogFollower::tail(&client, &cfg.cluster.cloudinit_log_path)?;
    let mut interrupted = false;
    loop {
        tokio::select! {
            line = next_line(&mut follower, ready.as_ref()) => match line? {
                Some(line) => println!("{line}"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                interrupted = true;
                break;
            }
        }
    }
    follower.close().await?;

    // 130: conventional exit status after SIGINT
    Ok(if interrupted { 130 } else { 0 })
}

async fn next_line(
    follower: &mut LogFollower,
    ready: Option<&Regex>,
) -> Result<Option<String>, ClusterError> {
    match ready {
        Some(pattern) => follower.next_ready_line(pattern).await,
        None => follower.next_line().await,
    }
}

fn master_client(cfg: &AppConfig, cluster: &Cluster) -> SshClient {
    SshClient::new(cluster.master_addr(), cfg.ssh.clone())
}

#[cfg(target_os = "macos")]
fn opener(url: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(target_os = "windows")]
fn opener(url: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.args(["/C", "start", url]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(url: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("xdg-open");
    cmd.arg(url);
    cmd
}
