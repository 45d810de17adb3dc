use std::{os::unix::fs::PermissionsExt, path::Path};

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{host::SessionMultiplexer, vm::LaunchCommand};

const SCREEN_DIR_ENV: &str = "SCREENDIR";

/// GNU screen with a private socket directory per vm.
#[derive(Debug, Clone)]
pub struct Screen {
    program: String,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            program: "screen".to_string(),
        }
    }
}

impl Screen {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, session_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.env(SCREEN_DIR_ENV, session_dir);
        command
    }
}

#[async_trait]
impl SessionMultiplexer for Screen {
    async fn wipe_dead_sessions(&self, session_dir: &Path) -> Result<()> {
        if !session_dir.exists() {
            return Ok(());
        }

        // screen exits non-zero whenever no sessions are left, ignore the status
        let output = self.command(session_dir).arg("-wipe").output().await?;
        debug!(
            "screen -wipe in {}: {}",
            session_dir.display(),
            String::from_utf8_lossy(&output.stdout).trim()
        );

        Ok(())
    }

    async fn launch_detached(&self, session_dir: &Path, command: LaunchCommand) -> Result<()> {
        tokio::fs::create_dir_all(session_dir).await?;
        // screen refuses socket dirs readable by others
        tokio::fs::set_permissions(session_dir, std::fs::Permissions::from_mode(0o700)).await?;

        let shell_line = command.shell_line();
        info!("Launching detached: {shell_line}");

        let output = self
            .command(session_dir)
            .arg("-dm")
            .arg("sh")
            .arg("-c")
            .arg(&shell_line)
            .output()
            .await?;

        if !output.status.success() {
            bail!(
                "failed to launch detached session: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(())
    }

    async fn attach(&self, session_dir: &Path) -> Result<()> {
        let status = self.command(session_dir).arg("-r").status().await?;

        if !status.success() {
            bail!("failed to attach to session in {}", session_dir.display());
        }

        Ok(())
    }
}
