use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use tracing::debug;

/// Rename `from` to `to`, replacing `to`. Falls back to copy and remove when
/// the two paths live on different filesystems.
pub async fn move_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    let from = from.as_ref();
    let to = to.as_ref();

    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!(
                "Copying {} to {} across filesystems",
                from.display(),
                to.display()
            );
            tokio::fs::copy(from, to)
                .await
                .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
            tokio::fs::remove_file(from).await?;
            Ok(())
        }
        Err(e) => Err(e)
            .with_context(|| format!("failed to move {} to {}", from.display(), to.display())),
    }
}
