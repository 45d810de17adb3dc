use std::{io::ErrorKind, path::Path, process::Output};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::host::IsoPackager;

/// Builds the iso9660/joliet seed image read by cloud-init.
#[derive(Debug, Clone, Default)]
pub struct SeedIsoPackager;

fn check_output(output: Output, tool: &str) -> Result<String> {
    if !output.status.success() {
        bail!(
            "{tool} failed to package seed image: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(text)
}

async fn run(mut command: Command, tool: &str) -> Result<String> {
    let output = command
        .output()
        .await
        .with_context(|| format!("failed to run {tool}"))?;
    check_output(output, tool)
}

fn iso9660_command(tool: &str, source_dir: &Path, output: &Path, volume_name: &str) -> Command {
    let mut command = Command::new(tool);
    command
        .arg("-output")
        .arg(output)
        .arg("-volid")
        .arg(volume_name)
        .arg("-joliet")
        .arg("-rock")
        .arg(source_dir);
    command
}

#[async_trait]
impl IsoPackager for SeedIsoPackager {
    async fn package(&self, source_dir: &Path, output: &Path, volume_name: &str) -> Result<String> {
        debug!(
            "Packaging {} into {}",
            source_dir.display(),
            output.display()
        );

        if cfg!(target_os = "macos") {
            let mut command = Command::new("hdiutil");
            command
                .arg("makehybrid")
                .arg("-o")
                .arg(output)
                .arg("-joliet")
                .arg("-iso")
                .arg("-default-volume-name")
                .arg(volume_name)
                .arg(source_dir);
            return run(command, "hdiutil").await;
        }

        package_iso9660("genisoimage", "mkisofs", source_dir, output, volume_name).await
    }
}

/// Run `primary`, switching to `fallback` only when `primary` is not installed.
async fn package_iso9660(
    primary: &str,
    fallback: &str,
    source_dir: &Path,
    output: &Path,
    volume_name: &str,
) -> Result<String> {
    let result = iso9660_command(primary, source_dir, output, volume_name)
        .output()
        .await;

    match result {
        Ok(out) => check_output(out, primary),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{primary} not found, trying {fallback}");
            run(
                iso9660_command(fallback, source_dir, output, volume_name),
                fallback,
            )
            .await
        }
        Err(e) => Err(e).with_context(|| format!("failed to run {primary}")),
    }
}
