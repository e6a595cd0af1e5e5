//! Archive downloads.

use std::path::Path;

use url::Url;

use crate::error::{IoResultExt, ProvisionError};

pub trait Downloader: Send + Sync {
    /// Fetch `url` into the file at `dest`, replacing it if present.
    fn download(&self, url: &Url, dest: &Path) -> Result<(), ProvisionError>;
}

/// Downloads over HTTP(S) and copies `file://` URLs from the local disk.
#[derive(Debug)]
pub struct HttpDownloader {
    runtime: tokio::runtime::Runtime,
}

impl HttpDownloader {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    async fn fetch(url: &Url) -> Result<Vec<u8>, ProvisionError> {
        let download_err = |reason: String| ProvisionError::Download {
            url: url.to_string(),
            reason,
        };

        let response = reqwest::get(url.clone())
            .await
            .map_err(|e| download_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_err(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_err(format!("failed to read response body: {e}")))?;

        Ok(bytes.to_vec())
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &Url, dest: &Path) -> Result<(), ProvisionError> {
        tracing::info!(url = %url, dest = %dest.display(), "downloading");

        if url.scheme() == "file" {
            let src = url.to_file_path().map_err(|_| ProvisionError::Download {
                url: url.to_string(),
                reason: "not a local file path".to_string(),
            })?;
            std::fs::copy(&src, dest)
                .io_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
            return Ok(());
        }

        let bytes = self.runtime.block_on(Self::fetch(url))?;
        std::fs::write(dest, &bytes)
            .io_context(|| format!("Failed to write download to {}", dest.display()))?;
        tracing::debug!(bytes = bytes.len(), "download complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_urls_are_copied() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let src = tmp.path().join("src.tar.gz");
        std::fs::write(&src, b"archive").expect("write should succeed in test temp dirs");
        let dest = tmp.path().join("dest.tar.gz");

        let url = Url::from_file_path(&src).expect("absolute path converts to URL");
        HttpDownloader::new()
            .expect("runtime should build")
            .download(&url, &dest)
            .expect("file download should succeed");

        assert_eq!(std::fs::read(&dest).unwrap(), b"archive");
    }

    #[test]
    fn missing_local_file_is_an_error() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let url = Url::from_file_path(tmp.path().join("absent.tar.gz")).unwrap();
        let result = HttpDownloader::new()
            .expect("runtime should build")
            .download(&url, &tmp.path().join("out"));
        assert!(result.is_err());
    }
}
