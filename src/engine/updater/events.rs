//! Update notifications
//!
//! Events are broadcast in the order they happen. A subscriber that lags
//! too far behind loses the oldest events, see `tokio::sync::broadcast`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::error::UpdateError;

/// Buffered events per subscriber
pub const EVENT_CAPACITY: usize = 64;

/// Payload of `UpdateEvent::Downloaded`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedInfo {
    /// Reserved for future metadata; always empty today
    pub metadata: Map<String, Value>,
    pub release_notes: Option<String>,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub feed_url: String,
}

#[derive(Debug, Clone)]
pub enum UpdateEvent {
    Checking,
    NotAvailable,
    Available { version: String },
    Downloaded(DownloadedInfo),
    Error(Arc<UpdateError>),
}

impl UpdateEvent {
    /// Stable event name, as used in logs and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            Self::Checking => "checking-for-update",
            Self::NotAvailable => "update-not-available",
            Self::Available { .. } => "update-available",
            Self::Downloaded(_) => "update-downloaded",
            Self::Error(_) => "error",
        }
    }
}

/// Sending half shared by an updater and its cycle tasks
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<UpdateEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.sender.subscribe()
    }

    /// Send to current subscribers. Having none is not an error.
    pub fn emit(&self, event: UpdateEvent) {
        tracing::debug!(event = event.name(), "update event");
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
