use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, info};
use url::Url;

use crate::{errors::AssetFetchError, host::Fetcher};

/// Streams a remote file to disk, truncating whatever was there.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<(), AssetFetchError> {
        info!("Downloading {url}");

        let mut response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| AssetFetchError::Server {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetFetchError::Server {
                url: url.to_string(),
                message: format!("unexpected status {status}"),
            });
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| AssetFetchError::filesystem(dest, e))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AssetFetchError::Server {
                url: url.to_string(),
                message: e.to_string(),
            })?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| AssetFetchError::filesystem(dest, e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| AssetFetchError::filesystem(dest, e))?;

        debug!("Wrote {written} bytes to {}", dest.display());
        Ok(())
    }
}
