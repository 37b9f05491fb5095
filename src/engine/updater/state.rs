//! Update State Machine
//!
//! Tracks where an updater is in its check cycle and which package, if any,
//! is ready to apply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current status of the update process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateStatus {
    /// No check in progress
    #[default]
    Idle,
    /// Fetching the feed
    Checking,
    /// Feed had nothing to offer
    NotAvailable,
    /// Feed offered a version, retention pass running
    Available { version: String },
    /// Fetching and verifying the package
    Downloading { version: String },
    /// Package verified and staged
    Downloaded { version: String, path: PathBuf },
    /// Cycle failed
    Failed { reason: String },
}

impl UpdateStatus {
    /// Whether a cycle is between `Checking` and a terminal status
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Checking | Self::Available { .. } | Self::Downloading { .. }
        )
    }
}

/// Per-instance updater state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdaterState {
    /// Feed queried by each check
    pub feed_url: Option<String>,
    /// Last verified package, kept across failed cycles
    pub staged_package: Option<PathBuf>,
    /// Version of `staged_package`
    pub staged_version: Option<String>,
    /// Current update status
    pub update_status: UpdateStatus,
    /// Last time a check started
    pub last_check: Option<DateTime<Utc>>,
}

impl UpdaterState {
    /// Transition to checking state
    pub fn start_checking(&mut self) {
        self.update_status = UpdateStatus::Checking;
        self.last_check = Some(Utc::now());
    }

    pub fn mark_not_available(&mut self) {
        self.update_status = UpdateStatus::NotAvailable;
    }

    pub fn mark_available(&mut self, version: &str) {
        self.update_status = UpdateStatus::Available {
            version: version.to_string(),
        };
    }

    pub fn start_downloading(&mut self, version: &str) {
        self.update_status = UpdateStatus::Downloading {
            version: version.to_string(),
        };
    }

    /// Stage a verified package, replacing any earlier one
    pub fn mark_downloaded(&mut self, version: &str, path: PathBuf) {
        self.staged_package = Some(path.clone());
        self.staged_version = Some(version.to_string());
        self.update_status = UpdateStatus::Downloaded {
            version: version.to_string(),
            path,
        };
    }

    /// Mark the cycle as failed. The staged package is left untouched.
    pub fn mark_failed(&mut self, reason: String) {
        self.update_status = UpdateStatus::Failed { reason };
    }

    /// Return to idle after a silently settled cycle
    pub fn reset(&mut self) {
        self.update_status = UpdateStatus::Idle;
    }
}
