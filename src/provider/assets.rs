use std::{
    fs::File,
    io::{self, BufReader},
    path::Path,
};

use anyhow::{Context, Result, bail};
use flate2::bufread::GzDecoder;
use tar::Archive;
use tempfile::NamedTempFile;
use tracing::info;

fn scratch_file_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create scratch file in {}", dir.display()))
}

/// Replace a gzip compressed file with its decompressed contents.
pub fn gunzip_in_place(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    info!("Decompressing {}", path.display());

    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));

    let mut scratch = scratch_file_beside(path)?;
    io::copy(&mut decoder, scratch.as_file_mut())
        .with_context(|| format!("failed to decompress {}", path.display()))?;

    scratch.persist(path)?;
    Ok(())
}

/// Pull a single regular file out of a `.tar.gz` archive and replace the
/// archive with it.
pub fn extract_file_in_place(archive_path: impl AsRef<Path>, member: &str) -> Result<()> {
    let archive_path = archive_path.as_ref();
    info!(
        "Extracting {} from archive {}",
        member,
        archive_path.display()
    );

    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));

    let mut scratch = scratch_file_beside(archive_path)?;
    let mut found = false;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        let matches = entry_path
            .file_name()
            .map(|name| name == member)
            .unwrap_or(false);

        if !matches || !entry.header().entry_type().is_file() {
            continue;
        }

        io::copy(&mut entry, scratch.as_file_mut())?;
        found = true;
        break;
    }

    if !found {
        bail!(
            "archive {} does not contain {}",
            archive_path.display(),
            member
        );
    }

    scratch.persist(archive_path)?;
    Ok(())
}
