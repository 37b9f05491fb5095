//! Package Download
//!
//! Streams a package body to a provisional file on disk.

use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::error::{Result, UpdateError};
use super::transport::Transport;

/// Download result with metadata
#[derive(Debug)]
pub struct DownloadResult {
    pub path: PathBuf,
    pub bytes_downloaded: u64,
}

/// Download manager for update packages
pub struct Downloader<'a> {
    transport: &'a dyn Transport,
}

impl<'a> Downloader<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Fetch `url` and write the body verbatim to `dest`.
    ///
    /// `dest` is truncated if it already exists. A non-2xx status fails
    /// before anything is written.
    pub async fn download<F>(
        &self,
        url: &str,
        dest: &Path,
        mut on_progress: F,
    ) -> Result<DownloadResult>
    where
        F: FnMut(u64),
    {
        let response = self.transport.get(url).await?;
        if !response.is_success() {
            return Err(UpdateError::PackageStatus(response.status));
        }

        let mut file = File::create(dest).await?;
        let mut downloaded = 0u64;
        let mut stream = response.body;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            on_progress(downloaded);
        }

        file.flush().await?;
        file.sync_all().await?;

        Ok(DownloadResult {
            path: dest.to_path_buf(),
            bytes_downloaded: downloaded,
        })
    }
}
