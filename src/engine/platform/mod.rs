//! Platform Variants
//!
//! A variant decides how packages are named in the cache, which cache
//! entries survive a retention pass, and how a staged package is applied.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::info;

use crate::engine::updater::error::{Result, UpdateError};

/// Supported platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
    Unknown,
}

impl Platform {
    /// Detect current platform
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        return Platform::MacOS;

        #[cfg(target_os = "linux")]
        return Platform::Linux;

        #[cfg(target_os = "windows")]
        return Platform::Windows;

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        return Platform::Unknown;
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Variant kind a host on this platform most likely ships
    pub fn default_variant(&self) -> VariantKind {
        if self.is_windows() {
            VariantKind::Installer
        } else {
            VariantKind::Archive
        }
    }
}

/// Variant selector used by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Archive,
    Installer,
}

/// Platform-specific behaviour injected into the update engine
pub trait PlatformVariant: Send + Sync {
    /// Name of the cache directory under the temp root
    fn updater_name(&self) -> &str;

    fn package_name(&self, version: &str) -> String {
        format!("{version}.zip")
    }

    /// `true` keeps `filename` during a retention pass for `version`
    fn retention_match(&self, version: &str, filename: &str) -> bool {
        filename.ends_with(&format!("{version}.zip"))
    }

    /// Hand the staged package over to the platform. Must not wait for it.
    fn apply(&self, package: &Path) -> Result<()>;
}

/// Plain `.zip` packages; unpacking is left to the host
#[derive(Debug, Clone)]
pub struct ArchiveVariant {
    name: String,
}

impl ArchiveVariant {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ArchiveVariant {
    fn default() -> Self {
        Self::new("updater")
    }
}

impl PlatformVariant for ArchiveVariant {
    fn updater_name(&self) -> &str {
        &self.name
    }

    fn apply(&self, _package: &Path) -> Result<()> {
        Err(UpdateError::ApplyUnsupported)
    }
}

/// Starts a program without waiting for it
pub trait Launcher: Send + Sync {
    fn spawn_detached(&self, program: &Path, args: &[String]) -> io::Result<()>;
}

/// `std::process` launcher: new process group, stdio discarded, child not awaited
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedLauncher;

impl Launcher for DetachedLauncher {
    fn spawn_detached(&self, program: &Path, args: &[String]) -> io::Result<()> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        let child = command.spawn()?;
        info!(pid = child.id(), program = %program.display(), "launched update package");
        Ok(())
    }
}

/// Self-contained installer executables, run unattended
#[derive(Clone)]
pub struct InstallerVariant {
    name: String,
    prefix: String,
    silent_flag: String,
    launcher: Arc<dyn Launcher>,
}

impl InstallerVariant {
    pub const DEFAULT_NAME: &'static str = "app-update";
    pub const DEFAULT_PREFIX: &'static str = "app";
    pub const DEFAULT_SILENT_FLAG: &'static str = "/silent";

    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            silent_flag: Self::DEFAULT_SILENT_FLAG.to_string(),
            launcher: Arc::new(DetachedLauncher),
        }
    }

    pub fn with_silent_flag(mut self, flag: impl Into<String>) -> Self {
        self.silent_flag = flag.into();
        self
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }
}

impl Default for InstallerVariant {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, Self::DEFAULT_PREFIX)
    }
}

impl std::fmt::Debug for InstallerVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallerVariant")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("silent_flag", &self.silent_flag)
            .finish_non_exhaustive()
    }
}

impl PlatformVariant for InstallerVariant {
    fn updater_name(&self) -> &str {
        &self.name
    }

    fn package_name(&self, version: &str) -> String {
        format!("{}-{version}.exe", self.prefix)
    }

    fn retention_match(&self, version: &str, filename: &str) -> bool {
        filename.ends_with(&format!("{version}.exe"))
    }

    fn apply(&self, package: &Path) -> Result<()> {
        self.launcher
            .spawn_detached(package, std::slice::from_ref(&self.silent_flag))
            .map_err(|source| UpdateError::Launch {
                path: package.to_path_buf(),
                source,
            })
    }
}
