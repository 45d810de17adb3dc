use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::process::Command;

use crate::host::NeighborTable;

/// Host neighbor (arp) table. Uses `ip neigh` on linux and `arp -a` elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ArpTable {
    interface: Option<String>,
}

impl ArpTable {
    pub fn new(interface: Option<String>) -> Self {
        Self { interface }
    }

    fn command(&self) -> Command {
        if cfg!(target_os = "linux") {
            let mut command = Command::new("ip");
            command.arg("neigh").arg("show");
            if let Some(interface) = &self.interface {
                command.arg("dev").arg(interface);
            }
            command
        } else {
            let mut command = Command::new("arp");
            command.arg("-a");
            if let Some(interface) = &self.interface {
                command.arg("-i").arg(interface);
            }
            command
        }
    }
}

#[async_trait]
impl NeighborTable for ArpTable {
    async fn snapshot(&self) -> Result<String> {
        let output = self.command().output().await?;

        if !output.status.success() {
            bail!(
                "failed to read neighbor table: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
