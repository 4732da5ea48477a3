//! File checksum tracking
//!
//! Watches registered files for content changes and drives cache
//! invalidation through registered listeners.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock, Semaphore};
use tracing::{debug, trace, warn};

use crate::cache::{CacheManager, ChecksumConfig};
use crate::error::{Error, Result};

/// Callback invoked when a tracked file's content changes
#[async_trait]
pub trait ChangeListener: Send + Sync {
    /// Listener name (for logs)
    fn name(&self) -> &str;

    /// Handle a change to `path`
    async fn on_change(&self, path: &Path) -> Result<()>;
}

/// What was last observed about a tracked file
#[derive(Debug, Clone, PartialEq)]
struct FileSnapshot {
    modified: Option<SystemTime>,
    size: u64,
    /// Hex content hash; absent for files above the large-file threshold
    checksum: Option<String>,
}

struct TrackedFile {
    /// `None` records that the file was observed absent
    snapshot: Option<FileSnapshot>,
    callbacks: Vec<Arc<dyn ChangeListener>>,
}

/// Outcome of one full check pass
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Set when the pass was dropped because another one was still running
    pub skipped: bool,
    pub files_checked: usize,
    /// Paths whose content changed during this pass
    pub changed: Vec<PathBuf>,
    pub callback_errors: usize,
}

/// Tracker statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStats {
    pub files_tracked: usize,
    /// Individual file checks performed
    pub checks: u64,
    /// Checks resolved by the metadata comparison alone
    pub fast_path_hits: u64,
    pub hashes_computed: u64,
    pub changes_detected: u64,
    pub callback_errors: u64,
    pub watching: bool,
}

#[derive(Default)]
struct TrackerCounters {
    checks: AtomicU64,
    fast_path_hits: AtomicU64,
    hashes_computed: AtomicU64,
    changes_detected: AtomicU64,
    callback_errors: AtomicU64,
}

/// State shared with the background watch task
struct TrackerShared {
    config: ChecksumConfig,
    files: RwLock<HashMap<PathBuf, TrackedFile>>,
    /// Single permit; holding it marks a check pass in flight
    check_permit: Semaphore,
    counters: TrackerCounters,
}

struct WatchTask {
    handle: tokio::task::JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Tracks file checksums and detects content changes
///
/// Change detection is two-phase: a file whose mtime and size are
/// unchanged is assumed unchanged without reading it; otherwise its
/// contents are hashed and compared against the last snapshot, so a
/// rewrite that produces identical bytes is not reported as a change.
/// A file appearing or disappearing is always a change.
///
/// # Usage
///
/// ```rust,ignore
/// let tracker = ChecksumTracker::new(config.checksum_tracking.clone());
/// let invalidator = Arc::new(NamespaceInvalidator::new(
///     Arc::clone(&cache),
///     vec![NS_GO_MODULES.to_string()],
/// ));
///
/// tracker.track("go.mod", Some(invalidator)).await;
/// tracker.start_watching().await;
/// ```
pub struct ChecksumTracker {
    shared: Arc<TrackerShared>,
    watch_task: Mutex<Option<WatchTask>>,
}

impl ChecksumTracker {
    /// Create a tracker; no background work starts until
    /// [`start_watching`](Self::start_watching)
    pub fn new(config: ChecksumConfig) -> Self {
        Self {
            shared: Arc::new(TrackerShared {
                config,
                files: RwLock::new(HashMap::new()),
                check_permit: Semaphore::new(1),
                counters: TrackerCounters::default(),
            }),
            watch_task: Mutex::new(None),
        }
    }

    // =========================================================================
    // Tracking
    // =========================================================================

    /// Start tracking a file
    ///
    /// Takes the initial snapshot immediately; a missing file is recorded
    /// as absent so that its later appearance counts as a change. Tracking
    /// an already-tracked path keeps the existing snapshot and appends the
    /// listener after those registered earlier.
    pub async fn track(&self, path: impl Into<PathBuf>, listener: Option<Arc<dyn ChangeListener>>) {
        let path = path.into();
        let snapshot = self.shared.take_snapshot(&path).await;

        let mut files = self.shared.files.write().await;
        match files.entry(path) {
            Entry::Occupied(mut occupied) => {
                if let Some(listener) = listener {
                    occupied.get_mut().callbacks.push(listener);
                }
            }
            Entry::Vacant(vacant) => {
                debug!("Started tracking {}", vacant.key().display());
                vacant.insert(TrackedFile {
                    snapshot,
                    callbacks: listener.into_iter().collect(),
                });
            }
        }
    }

    /// Stop tracking a file, reporting whether it was tracked
    pub async fn untrack(&self, path: &Path) -> bool {
        let removed = self.shared.files.write().await.remove(path).is_some();
        if removed {
            debug!("Stopped tracking {}", path.display());
        }
        removed
    }

    /// Paths currently tracked, sorted
    pub async fn tracked_files(&self) -> Vec<PathBuf> {
        let files = self.shared.files.read().await;
        let mut paths: Vec<PathBuf> = files.keys().cloned().collect();
        paths.sort();
        paths
    }

    // =========================================================================
    // Change Detection
    // =========================================================================

    /// Re-examine one tracked file now
    ///
    /// Updates the stored snapshot but does not invoke listeners; only
    /// [`check_all`](Self::check_all) and the watch loop dispatch them.
    pub async fn has_changed(&self, path: &Path) -> Result<bool> {
        let previous = {
            let files = self.shared.files.read().await;
            match files.get(path) {
                Some(tracked) => tracked.snapshot.clone(),
                None => return Err(Error::UntrackedFile(path.to_path_buf())),
            }
        };

        let (changed, snapshot) = self.shared.refresh(path, previous).await;

        let mut files = self.shared.files.write().await;
        if let Some(tracked) = files.get_mut(path) {
            tracked.snapshot = snapshot;
        }
        Ok(changed)
    }

    /// Check every tracked file once and notify listeners of changes
    ///
    /// Concurrent passes do not stack: when one is already running, the
    /// call returns immediately with `skipped` set and touches nothing.
    pub async fn check_all(&self) -> CheckReport {
        self.shared.checked_pass().await
    }

    // =========================================================================
    // Watch Loop
    // =========================================================================

    /// Start the background watch loop
    ///
    /// Runs one check pass per configured interval. Does nothing when
    /// checksum tracking is disabled in config or a loop is already
    /// running; manual checks keep working either way.
    pub async fn start_watching(&self) {
        if !self.shared.config.enabled {
            debug!("Checksum tracking disabled, not starting watch loop");
            return;
        }

        let mut slot = self.watch_task.lock().await;
        if slot.is_some() {
            debug!("Watch loop already running");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let interval = self.shared.config.watch_interval();

        let handle = tokio::spawn(async move {
            debug!("Watch loop started ({}ms interval)", interval.as_millis());
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let report = shared.checked_pass().await;
                        if !report.changed.is_empty() {
                            debug!("Watch pass found {} changed file(s)", report.changed.len());
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                }
            }
            debug!("Watch loop stopped");
        });

        *slot = Some(WatchTask {
            handle,
            shutdown: shutdown_tx,
        });
    }

    /// Stop the background watch loop
    ///
    /// Signals shutdown and waits for the task to finish; a pass already
    /// in flight completes first. A no-op when nothing is running.
    pub async fn stop_watching(&self) {
        let task = self.watch_task.lock().await.take();
        let Some(task) = task else {
            return;
        };

        let _ = task.shutdown.send(true);
        if let Err(e) = task.handle.await {
            warn!("Watch loop task failed: {}", e);
        }
    }

    /// Whether the background loop is currently running
    pub async fn is_watching(&self) -> bool {
        self.watch_task
            .lock()
            .await
            .as_ref()
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false)
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Counters accumulated since the tracker was created
    pub async fn stats(&self) -> TrackerStats {
        let files_tracked = self.shared.files.read().await.len();
        let counters = &self.shared.counters;

        TrackerStats {
            files_tracked,
            checks: counters.checks.load(Ordering::Relaxed),
            fast_path_hits: counters.fast_path_hits.load(Ordering::Relaxed),
            hashes_computed: counters.hashes_computed.load(Ordering::Relaxed),
            changes_detected: counters.changes_detected.load(Ordering::Relaxed),
            callback_errors: counters.callback_errors.load(Ordering::Relaxed),
            watching: self.is_watching().await,
        }
    }

    /// The configuration this tracker was built from
    pub fn config(&self) -> &ChecksumConfig {
        &self.shared.config
    }
}

impl TrackerShared {
    /// Run one check pass unless another is already in flight
    async fn checked_pass(&self) -> CheckReport {
        let Ok(_permit) = self.check_permit.try_acquire() else {
            trace!("Change check already running, skipping this pass");
            return CheckReport {
                skipped: true,
                ..CheckReport::default()
            };
        };

        self.run_check_pass().await
    }

    async fn run_check_pass(&self) -> CheckReport {
        // Snapshot the tracked set so no lock is held across file IO
        let tracked: Vec<(PathBuf, Option<FileSnapshot>, Vec<Arc<dyn ChangeListener>>)> = {
            let files = self.files.read().await;
            files
                .iter()
                .map(|(path, file)| (path.clone(), file.snapshot.clone(), file.callbacks.clone()))
                .collect()
        };

        let mut report = CheckReport {
            files_checked: tracked.len(),
            ..CheckReport::default()
        };
        let mut updates = Vec::new();
        let mut to_notify = Vec::new();

        for (path, previous, callbacks) in tracked {
            let (changed, next) = self.refresh(&path, previous).await;
            updates.push((path.clone(), next));

            if changed {
                debug!("Detected change in {}", path.display());
                report.changed.push(path.clone());
                if !callbacks.is_empty() {
                    to_notify.push((path, callbacks));
                }
            }
        }

        {
            let mut files = self.files.write().await;
            for (path, snapshot) in updates {
                if let Some(tracked) = files.get_mut(&path) {
                    tracked.snapshot = snapshot;
                }
            }
        }

        // Listeners for one file run in registration order; distinct files
        // are notified concurrently. A failing listener never stops the
        // ones after it.
        let dispatches = to_notify.into_iter().map(|(path, callbacks)| async move {
            let mut errors = 0usize;
            for listener in callbacks {
                if let Err(e) = listener.on_change(&path).await {
                    warn!(
                        listener = listener.name(),
                        error = %e,
                        "Change listener failed for {}",
                        path.display()
                    );
                    errors += 1;
                }
            }
            errors
        });
        report.callback_errors = join_all(dispatches).await.into_iter().sum();
        self.counters
            .callback_errors
            .fetch_add(report.callback_errors as u64, Ordering::Relaxed);

        report
    }

    /// Compare `path` against its previous snapshot and produce the next one
    async fn refresh(
        &self,
        path: &Path,
        previous: Option<FileSnapshot>,
    ) -> (bool, Option<FileSnapshot>) {
        self.counters.checks.fetch_add(1, Ordering::Relaxed);

        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                trace!("Stat failed for {}: {}", path.display(), e);
                None
            }
        };

        let (changed, next) = match (previous, meta) {
            // Still absent
            (None, None) => (false, None),
            // Disappeared
            (Some(_), None) => (true, None),
            // Appeared
            (None, Some(meta)) => (true, self.finish_snapshot(path, &meta).await),
            // Present on both observations
            (Some(prev), Some(meta)) => {
                let size = meta.len();
                let modified = meta.modified().ok();

                // Fast path: unchanged metadata means unchanged content
                if prev.modified.is_some() && prev.modified == modified && prev.size == size {
                    self.counters.fast_path_hits.fetch_add(1, Ordering::Relaxed);
                    return (false, Some(prev));
                }

                match self.finish_snapshot(path, &meta).await {
                    Some(next) => {
                        let changed = match (&prev.checksum, &next.checksum) {
                            // Metadata moved but the contents did not
                            (Some(old), Some(new)) => old != new,
                            // No hash on at least one side; trust the metadata
                            _ => true,
                        };
                        (changed, Some(next))
                    }
                    // Vanished between stat and read
                    None => (true, None),
                }
            }
        };

        if changed {
            self.counters.changes_detected.fetch_add(1, Ordering::Relaxed);
        }
        (changed, next)
    }

    /// Stat and (when small enough) hash `path`
    async fn take_snapshot(&self, path: &Path) -> Option<FileSnapshot> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => self.finish_snapshot(path, &meta).await,
            Err(e) => {
                trace!("Stat failed for {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Build a snapshot from stat results, hashing files under the
    /// large-file threshold
    async fn finish_snapshot(&self, path: &Path, meta: &std::fs::Metadata) -> Option<FileSnapshot> {
        let size = meta.len();
        let modified = meta.modified().ok();

        let checksum = if size >= self.config.large_file_threshold_bytes {
            None
        } else {
            match self.config.algorithm.hash_file(path).await {
                Ok(hash) => {
                    self.counters.hashes_computed.fetch_add(1, Ordering::Relaxed);
                    Some(hash)
                }
                Err(e) => {
                    trace!("Hash failed for {}: {}", path.display(), e);
                    return None;
                }
            }
        };

        Some(FileSnapshot {
            modified,
            size,
            checksum,
        })
    }
}

// ============================================================================
// NamespaceInvalidator
// ============================================================================

/// Clears cache namespaces when a tracked file changes
///
/// The standard bridge between the tracker and the cache: register one
/// per dependency file, listing the namespaces whose entries derive from
/// that file (for example `go.mod` -> `goModules` and `testResults`).
pub struct NamespaceInvalidator {
    cache: Arc<CacheManager>,
    namespaces: Vec<String>,
}

impl NamespaceInvalidator {
    pub fn new(cache: Arc<CacheManager>, namespaces: Vec<String>) -> Self {
        Self { cache, namespaces }
    }
}

#[async_trait]
impl ChangeListener for NamespaceInvalidator {
    fn name(&self) -> &str {
        "namespace-invalidator"
    }

    async fn on_change(&self, path: &Path) -> Result<()> {
        for namespace in &self.namespaces {
            self.cache.invalidate_namespace(namespace)?;
        }
        debug!(
            "Invalidated {} namespace(s) after change in {}",
            self.namespaces.len(),
            path.display()
        );
        Ok(())
    }
}
