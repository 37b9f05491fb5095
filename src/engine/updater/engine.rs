//! Update Engine
//!
//! Drives one check cycle at a time:
//! feed → manifest → retention pass → download → verify → rename → notify.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use serde_json::Map;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::cache::CacheDirectory;
use super::download::Downloader;
use super::error::{Result, UpdateError};
use super::events::{DownloadedInfo, EventBus, UpdateEvent};
use super::manifest::{parse_feed_body, UpdateManifest};
use super::state::{UpdateStatus, UpdaterState};
use super::transport::{HttpTransport, Transport};
use super::verify::{ChecksumVerifier, IntegrityVerifier};
use crate::engine::platform::PlatformVariant;

/// Self-update client. Clones share the same instance.
#[derive(Clone)]
pub struct Updater {
    inner: Arc<Inner>,
}

struct Inner {
    variant: Arc<dyn PlatformVariant>,
    transport: Arc<dyn Transport>,
    verifier: Arc<dyn IntegrityVerifier>,
    cache: CacheDirectory,
    state: Mutex<UpdaterState>,
    in_flight: AtomicBool,
    events: EventBus,
}

/// Clears the single-flight flag when a cycle settles, panics included
struct InFlightGuard {
    inner: Arc<Inner>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.store(false, Ordering::Release);
    }
}

pub struct UpdaterBuilder {
    variant: Arc<dyn PlatformVariant>,
    transport: Option<Arc<dyn Transport>>,
    verifier: Option<Arc<dyn IntegrityVerifier>>,
    cache_root: Option<PathBuf>,
    feed_url: Option<String>,
}

impl UpdaterBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn IntegrityVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Parent of the cache directory (defaults to the platform temp dir)
    pub fn cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }

    pub fn feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = Some(url.into());
        self
    }

    pub fn build(self) -> Updater {
        let name = self.variant.updater_name().to_string();
        let cache = match self.cache_root {
            Some(root) => CacheDirectory::with_root(root, &name),
            None => CacheDirectory::for_updater(&name),
        };
        let state = UpdaterState {
            feed_url: self.feed_url,
            ..UpdaterState::default()
        };

        Updater {
            inner: Arc::new(Inner {
                variant: self.variant,
                transport: self
                    .transport
                    .unwrap_or_else(|| Arc::new(HttpTransport::new())),
                verifier: self
                    .verifier
                    .unwrap_or_else(|| Arc::new(ChecksumVerifier::new())),
                cache,
                state: Mutex::new(state),
                in_flight: AtomicBool::new(false),
                events: EventBus::new(),
            }),
        }
    }
}

impl Updater {
    /// Updater with the HTTP transport, checksum verifier and temp-dir cache
    pub fn new(variant: Arc<dyn PlatformVariant>) -> Self {
        Self::builder(variant).build()
    }

    pub fn builder(variant: Arc<dyn PlatformVariant>) -> UpdaterBuilder {
        UpdaterBuilder {
            variant,
            transport: None,
            verifier: None,
            cache_root: None,
            feed_url: None,
        }
    }

    pub fn set_feed_url(&self, url: impl Into<String>) {
        self.inner.state().feed_url = Some(url.into());
    }

    pub fn feed_url(&self) -> Option<String> {
        self.inner.state().feed_url.clone()
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.inner.events.subscribe()
    }

    pub fn status(&self) -> UpdateStatus {
        self.inner.state().update_status.clone()
    }

    /// Last verified package, if any cycle has completed
    pub fn staged_package(&self) -> Option<PathBuf> {
        self.inner.state().staged_package.clone()
    }

    pub fn state(&self) -> UpdaterState {
        self.inner.state().clone()
    }

    pub fn cache(&self) -> &CacheDirectory {
        &self.inner.cache
    }

    pub fn is_checking(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Start a check cycle on the current tokio runtime.
    ///
    /// Emits `Checking` before returning. Returns `Ok(None)` without doing
    /// anything if a cycle is already running. The outcome is reported
    /// through events only; the handle just tells when the cycle settled.
    pub fn check_for_updates(&self) -> Result<Option<JoinHandle<()>>> {
        let feed_url = self.feed_url().ok_or(UpdateError::NoFeedUrl)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| UpdateError::Runtime(e.to_string()))?;

        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("update check already in flight");
            return Ok(None);
        }
        let guard = InFlightGuard {
            inner: Arc::clone(&self.inner),
        };

        self.inner.state().start_checking();
        self.inner.events.emit(UpdateEvent::Checking);

        let inner = Arc::clone(&self.inner);
        Ok(Some(runtime.spawn(async move {
            let _guard = guard;
            inner.settle(&feed_url).await;
        })))
    }

    /// Run a retention pass outside a check cycle
    pub async fn clean_cache(&self, keep: Option<&str>) -> usize {
        let inner = &self.inner;
        inner
            .cache
            .retain(keep, |v, f| inner.retention_match(v, f))
            .await
    }

    /// Apply the staged package through the platform variant.
    ///
    /// Returns `Ok(false)` when nothing has been staged yet.
    pub fn quit_and_install(&self) -> Result<bool> {
        let Some(package) = self.staged_package() else {
            debug!("no staged package to apply");
            return Ok(false);
        };
        info!(package = %package.display(), "applying update");
        self.inner.variant.apply(&package)?;
        Ok(true)
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, UpdaterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn retention_match(&self, version: &str, filename: &str) -> bool {
        self.variant.retention_match(version, filename)
    }

    async fn settle(&self, feed_url: &str) {
        match self.run_cycle(feed_url).await {
            Ok(()) => {}
            Err(e) if e.is_suppressed() => {
                debug!(error = %e, "update check settled silently");
                self.state().reset();
            }
            Err(e) => {
                warn!(error = %e, "update check failed");
                self.state().mark_failed(e.to_string());
                self.events.emit(UpdateEvent::NotAvailable);
                self.events.emit(UpdateEvent::Error(Arc::new(e)));
            }
        }
    }

    async fn run_cycle(&self, feed_url: &str) -> Result<()> {
        let response = self.transport.get(feed_url).await?;
        let manifest = if response.is_success() {
            let body = response.collect().await?;
            parse_feed_body(&body)?
        } else {
            debug!(status = response.status, "feed answered without an update");
            None
        };

        let Some(manifest) = manifest else {
            info!("no update available");
            self.state().mark_not_available();
            self.events.emit(UpdateEvent::NotAvailable);
            self.cache
                .retain(None, |v, f| self.retention_match(v, f))
                .await;
            return Ok(());
        };

        info!(version = %manifest.version, "update available");
        self.state().mark_available(&manifest.version);
        self.events.emit(UpdateEvent::Available {
            version: manifest.version.clone(),
        });
        self.cache
            .retain(Some(&manifest.version), |v, f| self.retention_match(v, f))
            .await;

        let package = self.stage(&manifest).await?;

        self.state().mark_downloaded(&manifest.version, package);
        self.events.emit(UpdateEvent::Downloaded(DownloadedInfo {
            metadata: Map::new(),
            release_notes: manifest.release_notes,
            version: manifest.version,
            timestamp: chrono::Utc::now(),
            feed_url: feed_url.to_string(),
        }));
        Ok(())
    }

    /// Make sure the package for `manifest` sits verified at its final path.
    async fn stage(&self, manifest: &UpdateManifest) -> Result<PathBuf> {
        self.cache.ensure().await?;
        let target = self
            .cache
            .package_path(&self.variant.package_name(&manifest.version));

        if CacheDirectory::exists(&target).await {
            info!(package = %target.display(), "package already cached");
            return Ok(target);
        }

        self.state().start_downloading(&manifest.version);
        let provisional = CacheDirectory::temp_path(&target);
        let result = Downloader::new(self.transport.as_ref())
            .download(&manifest.url, &provisional, |bytes| {
                trace!(bytes, "downloading package")
            })
            .await?;

        // A mismatch leaves the provisional file behind for inspection
        if let Some(hash) = &manifest.hash {
            self.verifier.verify(&provisional, hash).await?;
        }

        tokio::fs::rename(&provisional, &target).await?;
        info!(
            package = %target.display(),
            bytes = result.bytes_downloaded,
            "package downloaded"
        );
        Ok(target)
    }
}
