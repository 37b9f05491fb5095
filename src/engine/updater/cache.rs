//! Cache Directory Manager
//!
//! Owns `{temp_root}/{updater_name}`: the only place packages are staged.
//! Two updaters sharing a name share this directory and race on it; pick a
//! distinct name per deployment channel.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::error::{Result, UpdateError};

/// Suffix of a package that is still being downloaded or failed verification
pub const PROVISIONAL_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone)]
pub struct CacheDirectory {
    dir: PathBuf,
}

impl CacheDirectory {
    /// Cache for `name` under the platform temp directory
    pub fn for_updater(name: &str) -> Self {
        Self::with_root(std::env::temp_dir(), name)
    }

    /// Cache for `name` under a custom root (for testing)
    pub fn with_root(root: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            dir: root.into().join(name),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if needed.
    ///
    /// An existing directory is fine; an existing non-directory is an error.
    pub async fn ensure(&self) -> Result<&Path> {
        match fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => Ok(&self.dir),
            Ok(_) => Err(UpdateError::NotADirectory(self.dir.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.dir).await?;
                debug!(dir = %self.dir.display(), "created cache directory");
                Ok(&self.dir)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Final location of a package
    pub fn package_path(&self, package_name: &str) -> PathBuf {
        self.dir.join(package_name)
    }

    /// Provisional sibling of `path` used while downloading
    pub fn temp_path(path: &Path) -> PathBuf {
        let mut name: OsString = path.as_os_str().to_owned();
        name.push(PROVISIONAL_SUFFIX);
        PathBuf::from(name)
    }

    pub async fn exists(path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Entry names currently in the cache, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = Vec::new();
        let mut read_dir = match fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = read_dir.next_entry().await? {
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }
        entries.sort();
        Ok(entries)
    }

    /// Retention pass.
    ///
    /// With `keep = None` every entry is deleted. With `keep = Some(version)`
    /// an entry survives exactly when `matches(version, entry)` is true.
    /// Deletion failures are logged and skipped. Returns the number of
    /// entries removed.
    pub async fn retain<F>(&self, keep: Option<&str>, matches: F) -> usize
    where
        F: Fn(&str, &str) -> bool,
    {
        let entries = match self.list().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot list cache directory");
                return 0;
            }
        };

        let mut removed = 0;
        for name in entries {
            if keep.is_some_and(|version| matches(version, &name)) {
                continue;
            }
            let path = self.dir.join(&name);
            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(entry = %name, "removed stale cache entry");
                    removed += 1;
                }
                Err(e) => warn!(entry = %name, error = %e, "failed to remove cache entry"),
            }
        }
        removed
    }
}
