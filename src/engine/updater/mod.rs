//! Feed-driven Self-Update System
//!
//! Components:
//! - `engine` - Check cycle and single-flight guard
//! - `manifest` - Feed document parsing
//! - `transport` - HTTP GET seam
//! - `download` - Streaming package download
//! - `verify` - Checksum verification
//! - `cache` - Cache directory and retention pass
//! - `state` - Update state machine
//! - `events` - Notifications to the host

pub mod cache;
pub mod download;
pub mod engine;
pub mod error;
pub mod events;
pub mod manifest;
pub mod state;
pub mod transport;
pub mod verify;

pub use cache::CacheDirectory;
pub use engine::{Updater, UpdaterBuilder};
pub use error::{Result, UpdateError};
pub use events::{DownloadedInfo, UpdateEvent};
pub use manifest::UpdateManifest;
pub use state::{UpdateStatus, UpdaterState};
pub use transport::{HttpTransport, Transport, TransportResponse};
pub use verify::{ChecksumVerifier, IntegrityVerifier};
