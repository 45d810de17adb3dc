use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::host::RemoteShell;

/// OpenSSH client logging in as the invoking user.
#[derive(Debug, Clone)]
pub struct Ssh {
    options: Vec<String>,
}

impl Ssh {
    pub fn new(options: Vec<String>) -> Self {
        Self { options }
    }

    fn command(&self, host: &str) -> Command {
        let mut command = Command::new("ssh");
        command.args(&self.options).arg(host);
        command
    }
}

#[async_trait]
impl RemoteShell for Ssh {
    async fn interactive(&self, host: &str) -> Result<()> {
        debug!("Opening ssh session to {host}");
        let status = self.command(host).status().await?;

        if !status.success() {
            bail!("ssh session to {host} exited with {status}");
        }

        Ok(())
    }

    async fn run(&self, host: &str, command: &str) -> Result<String> {
        debug!("Running `{command}` on {host}");
        let output = self.command(host).arg(command).output().await?;

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        // a guest shutting down drops the connection, only fail when nothing came back
        if !output.status.success() && text.trim().is_empty() {
            bail!("ssh command on {host} exited with {}", output.status);
        }

        Ok(text)
    }
}
