use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, warn};
use url::Url;

use crate::{errors::AssetFetchError, host::Fetcher};

/// Name keyed store of downloaded provider assets, shared across vms.
///
/// Entries are `<prefix>.<basename of the url>` directly under the root. An
/// existing entry is always trusted; there is no eviction.
#[derive(Clone)]
pub struct AssetCache {
    root: PathBuf,
    fetcher: Arc<dyn Fetcher>,
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("root", &self.root)
            .finish()
    }
}

fn url_basename(url: &Url) -> Option<&str> {
    url.path_segments()?.next_back().filter(|s| !s.is_empty())
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove cache entry {}: {e}", path.display());
        }
    }
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            root: root.into(),
            fetcher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, source: &str, prefix: &str) -> Result<PathBuf, AssetFetchError> {
        let url = Url::parse(source).map_err(|_| AssetFetchError::Url(source.to_string()))?;
        let basename = url_basename(&url).ok_or_else(|| AssetFetchError::Url(source.to_string()))?;

        Ok(self.root.join(format!("{prefix}.{basename}")))
    }

    /// Return the cached copy of `source`, downloading and post-processing it
    /// first when it is not cached yet.
    pub async fn load<F>(
        &self,
        source: &str,
        prefix: &str,
        post_process: F,
    ) -> Result<PathBuf, AssetFetchError>
    where
        F: FnOnce(&Path) -> anyhow::Result<()> + Send + 'static,
    {
        let path = self.entry_path(source, prefix)?;

        if path.exists() {
            debug!("Cache hit for {source} at {}", path.display());
            return Ok(path);
        }

        let url = Url::parse(source).map_err(|_| AssetFetchError::Url(source.to_string()))?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AssetFetchError::filesystem(&self.root, e))?;

        if let Err(e) = self.fetcher.fetch(&url, &path).await {
            discard(&path).await;
            return Err(e);
        }

        let target = path.clone();
        let processed = tokio::task::spawn_blocking(move || post_process(&target)).await;

        let message = match processed {
            Ok(Ok(())) => {
                info!("Cached {source} at {}", path.display());
                return Ok(path);
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(e) => format!("post-processing task failed: {e}"),
        };

        discard(&path).await;
        Err(AssetFetchError::Decoding {
            url: source.to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;

    use super::*;
    use crate::test_support::FakeFetcher;

    #[test]
    fn test_entry_path() {
        let cache = AssetCache::new("/cache", Arc::new(FakeFetcher::default()));
        assert_eq!(
            cache
                .entry_path("https://example.com/a/b/kernel-generic", "UbuntuProvider")
                .unwrap(),
            PathBuf::from("/cache/UbuntuProvider.kernel-generic")
        );

        assert!(matches!(
            cache.entry_path("not a url", "P"),
            Err(AssetFetchError::Url(_))
        ));
        assert!(matches!(
            cache.entry_path("https://example.com/dir/", "P"),
            Err(AssetFetchError::Url(_))
        ));
    }

    #[tokio::test]
    async fn test_miss_fetches_and_post_processes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let cache = AssetCache::new(temp_dir.path().join("cache"), fetcher.clone());

        let path = cache
            .load("https://example.com/kernel", "Prov", |path| {
                std::fs::write(path, b"processed")?;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(path, temp_dir.path().join("cache/Prov.kernel"));
        assert_eq!(std::fs::read(&path).unwrap(), b"processed");
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_hit_skips_post_process() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let cache = AssetCache::new(temp_dir.path(), fetcher.clone());

        let existing = temp_dir.path().join("Prov.kernel");
        std::fs::write(&existing, b"cached").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let path = cache
            .load("https://example.com/kernel", "Prov", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(path, existing);
        assert_eq!(std::fs::read(&path).unwrap(), b"cached");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_post_process_discards_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let cache = AssetCache::new(temp_dir.path(), fetcher.clone());

        let err = cache
            .load("https://example.com/image.tar.gz", "Prov", |_| {
                bail!("not a tarball")
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AssetFetchError::Decoding { .. }));
        assert!(!temp_dir.path().join("Prov.image.tar.gz").exists());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_no_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::failing());
        let cache = AssetCache::new(temp_dir.path(), fetcher);

        let err = cache
            .load("https://example.com/kernel", "Prov", |_| Ok(()))
            .await
            .unwrap_err();

        assert!(matches!(err, AssetFetchError::Server { .. }));
        assert!(!temp_dir.path().join("Prov.kernel").exists());
    }
}
