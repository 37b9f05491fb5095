//! feed-updater - Feed-driven self-update client
//!
//! Polls a feed for a manifest, downloads and verifies the package into a
//! per-updater cache directory, and hands it to a platform variant to apply.

pub mod engine;

pub use engine::updater::{DownloadedInfo, UpdateError, UpdateEvent, UpdateStatus, Updater};
pub use engine::{ArchiveVariant, InstallerVariant, PlatformVariant, UpdaterConfig};
