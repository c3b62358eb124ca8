//! Read-only view of the provisioned cluster, resolved from the state
//! document that a provisioning run leaves behind.

use std::path::Path;

use serde_json::Value;

use crate::config::AppConfig;
use crate::error::ClusterError;

/// Read one output value from a provisioning state document.
///
/// The document shape is `{"outputs": {<key>: {"value": <string>, ...}, ...}}`.
/// The stored value is returned exactly as written, no normalization.
pub fn read_output(path: &Path, key: &str) -> Result<String, ClusterError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| state_unavailable(format!("read {}: {e}", path.display())))?;
    let doc: Value = serde_json::from_str(&raw)
        .map_err(|e| state_unavailable(format!("parse {}: {e}", path.display())))?;
    let value = doc
        .get("outputs")
        .and_then(|outputs| outputs.get(key))
        .and_then(|output| output.get("value"))
        .ok_or_else(|| state_unavailable(format!("output '{key}' not found")))?;
    match value.as_str() {
        Some(s) => Ok(s.to_string()),
        None => Err(state_unavailable(format!("output '{key}' is not a string"))),
    }
}

fn state_unavailable(reason: String) -> ClusterError {
    tracing::debug!(%reason, "state document read failed");
    ClusterError::StateUnavailable { reason }
}

#[derive(Debug, Clone)]
pub struct Cluster {
    master_addr: String,
    web_ui_port: u16,
}

impl Cluster {
    /// Resolve the master address from the state document named in `cfg`.
    pub fn from_state(cfg: &AppConfig) -> Result<Self, ClusterError> {
        let master_addr = read_output(&cfg.terraform.state_path(), &cfg.cluster.master_addr_key)?;
        Ok(Self {
            master_addr,
            web_ui_port: cfg.cluster.web_ui_port,
        })
    }

    pub fn master_addr(&self) -> &str {
        &self.master_addr
    }

    /// URL of the master node's web UI.
    pub fn web_ui_url(&self) -> String {
        format!("http://{}:{}", self.master_addr, self.web_ui_port)
    }
}
