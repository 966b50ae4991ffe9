//! Session module - serialized conversation state management
//!
//! This module owns all mutable per-conversation state. The central type is
//! [`SessionStore`], which exposes exactly one mutation entry point:
//! [`SessionStore::with_session`]. The store hands the provided function
//! exclusive access to the session for the duration of the call, so two
//! callers can never interleave mutations for the same key, while callers
//! for different keys proceed fully in parallel.
//!
//! There is deliberately no `get`/`set` pair: a read-check-then-write pattern
//! outside the exclusive contract is how lost updates happen, so the API
//! does not offer one.
//!
//! # Example
//!
//! ```
//! use futures::FutureExt;
//! use switchboard::session::{Session, SessionStore, Turn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SessionStore::new_memory();
//!
//!     store
//!         .with_session("telegram:chat123", |session: &mut Session| {
//!             async move {
//!                 session.apply(Turn::user("Hello!"));
//!                 session.apply(Turn::assistant("Hi there!"));
//!                 Ok(())
//!             }
//!             .boxed()
//!         })
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod types;

pub use types::{Role, Session, ToolCall, ToolRecord, ToolResult, ToolStatus, Turn};

use crate::config::Config;
use crate::error::{Result, SwitchboardError};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One cached session slot. `None` until the first exclusive access loads
/// (or creates) the session.
type SessionCell = Arc<Mutex<Option<Session>>>;

/// Store giving each conversation exclusive, serialized access to its own
/// history.
///
/// One mutual-exclusion primitive exists per session key, created lazily and
/// reused. The primitive is never held across an unrelated key, so
/// throughput scales with the number of distinct active conversations.
///
/// # Persistence
///
/// When created with `new()` or `with_dir()`, every committed mutation is
/// flushed to one JSON snapshot per key before `with_session` returns. The
/// snapshot is written to a temporary sibling and renamed into place, so a
/// crashed flush never leaves a half-written record observable to a later
/// load. Use `new_memory()` for tests or embedders that do not need
/// durability.
pub struct SessionStore {
    /// Per-key cells; the outer lock is held only to look up or insert a cell
    cells: Arc<Mutex<HashMap<String, SessionCell>>>,
    /// Optional directory for durable snapshots
    storage_dir: Option<PathBuf>,
}

impl SessionStore {
    /// Create a session store persisting under `~/.switchboard/sessions/`.
    ///
    /// # Errors
    /// Returns an error if the sessions directory cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_dir(Config::dir().join("sessions"))
    }

    /// Create a session store persisting under a custom directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn with_dir(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            cells: Arc::new(Mutex::new(HashMap::new())),
            storage_dir: Some(dir),
        })
    }

    /// Create an in-memory store without persistence.
    pub fn new_memory() -> Self {
        Self {
            cells: Arc::new(Mutex::new(HashMap::new())),
            storage_dir: None,
        }
    }

    /// Run `f` with exclusive access to the session for `key`.
    ///
    /// This is the sole mutation entry point. The store guarantees no other
    /// caller's function for the same key runs concurrently; callers for
    /// different keys proceed in parallel. The session is created on first
    /// reference, loaded from its durable snapshot if one exists.
    ///
    /// `f` operates on a working copy. On `Ok` the revision counter is
    /// incremented and a durable snapshot is written *before* control
    /// returns; only then does the working copy replace the cached state. On
    /// `Err` the inner failure is surfaced unchanged and the session is left
    /// exactly as before the call.
    ///
    /// # Errors
    /// - the inner function's error, unchanged
    /// - `SwitchboardError::Persistence` if the durable flush fails, so
    ///   callers can distinguish a retryable flush from a logic failure
    pub async fn with_session<T, F>(&self, key: &str, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Session) -> BoxFuture<'a, Result<T>>,
    {
        let cell = self.cell(key).await;
        let mut slot = cell.lock().await;

        let mut working = match slot.as_ref() {
            Some(session) => session.clone(),
            None => self.load_or_new(key).await?,
        };

        let value = f(&mut working).await?;

        working.revision += 1;
        working.touch();
        self.flush(&working).await?;
        *slot = Some(working);
        Ok(value)
    }

    /// Read-only snapshot of the session for `key`, without creating it.
    ///
    /// Checks the in-memory cache first, then the durable store. Returns
    /// `None` when the session has never existed.
    pub async fn snapshot(&self, key: &str) -> Result<Option<Session>> {
        // Clone the cell out so the map lock is not held while waiting for
        // an in-flight exclusive section to finish.
        let cell = {
            let cells = self.cells.lock().await;
            cells.get(key).cloned()
        };
        if let Some(cell) = cell {
            let slot = cell.lock().await;
            if let Some(session) = slot.as_ref() {
                return Ok(Some(session.clone()));
            }
        }
        self.load(key).await
    }

    /// Delete a session from cache and durable storage.
    ///
    /// Intended for operator tooling; the core never deletes automatically.
    pub async fn delete(&self, key: &str) -> Result<()> {
        {
            let mut cells = self.cells.lock().await;
            cells.remove(key);
        }
        if let Some(ref dir) = self.storage_dir {
            let path = dir.join(format!("{}.json", sanitize_key(key)));
            if path.exists() {
                tokio::fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }

    /// List all known session keys, merging cache and durable storage.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = {
            let cells = self.cells.lock().await;
            cells.keys().cloned().collect()
        };

        if let Some(ref dir) = self.storage_dir {
            let mut entries = tokio::fs::read_dir(dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    // Read the snapshot for the original (unsanitized) key.
                    if let Ok(content) = tokio::fs::read_to_string(&path).await {
                        if let Ok(session) = serde_json::from_str::<Session>(&content) {
                            if !keys.contains(&session.key) {
                                keys.push(session.key);
                            }
                        }
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Number of sessions currently held in the in-memory cache.
    pub async fn cache_size(&self) -> usize {
        self.cells.lock().await.len()
    }

    /// Evict sessions idle past `threshold` from the in-memory cache.
    ///
    /// Durable state is untouched; an evicted session reloads on next
    /// access. A cell is only removed when no caller holds or awaits its
    /// exclusion primitive: the map's reference must be the last one, and
    /// the per-key lock must be acquirable immediately. Both checks happen
    /// under the map lock, and `with_session` clones cells under that same
    /// lock, so eviction can never race an in-flight exclusive section.
    ///
    /// Returns the number of evicted sessions.
    pub async fn evict_idle(&self, threshold: Duration) -> usize {
        let cutoff = chrono::Utc::now()
            - chrono::Duration::from_std(threshold).unwrap_or_else(|_| chrono::Duration::MAX);
        let mut evicted = 0;

        let mut cells = self.cells.lock().await;
        cells.retain(|key, cell| {
            if Arc::strong_count(cell) > 1 {
                return true;
            }
            let Ok(slot) = cell.try_lock() else {
                return true;
            };
            match slot.as_ref() {
                Some(session) if session.last_active < cutoff => {
                    debug!(session = %key, "Evicting idle session from cache");
                    evicted += 1;
                    false
                }
                Some(_) => true,
                // A cell that was never loaded holds no state worth keeping.
                None => false,
            }
        });
        evicted
    }

    /// Spawn the background eviction sweep.
    ///
    /// Every `interval`, sessions idle past `threshold` are evicted. The
    /// task stops when the shutdown signal fires.
    pub fn start_sweeper(
        &self,
        interval: Duration,
        threshold: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            info!(
                interval_secs = interval.as_secs(),
                idle_secs = threshold.as_secs(),
                "Session eviction sweep started"
            );
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(interval) => {
                        let evicted = store.evict_idle(threshold).await;
                        if evicted > 0 {
                            debug!(evicted, "Eviction sweep removed idle sessions");
                        }
                    }
                }
            }
            info!("Session eviction sweep stopped");
        })
    }

    /// Look up or lazily create the cell for `key`.
    async fn cell(&self, key: &str) -> SessionCell {
        let mut cells = self.cells.lock().await;
        cells
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Load the session for `key` from durable storage, if present.
    async fn load(&self, key: &str) -> Result<Option<Session>> {
        let Some(ref dir) = self.storage_dir else {
            return Ok(None);
        };
        let path = dir.join(format!("{}.json", sanitize_key(key)));
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    /// Load the session for `key`, creating an empty one on miss.
    async fn load_or_new(&self, key: &str) -> Result<Session> {
        match self.load(key).await? {
            Some(session) => Ok(session),
            None => Ok(Session::new(key)),
        }
    }

    /// Write a durable snapshot, atomically replacing any previous one.
    ///
    /// The snapshot lands in a `.tmp` sibling first and is renamed into
    /// place, so a concurrent load observes either the old or the new
    /// record, never a torn one.
    async fn flush(&self, session: &Session) -> Result<()> {
        let Some(ref dir) = self.storage_dir else {
            return Ok(());
        };

        let path = dir.join(format!("{}.json", sanitize_key(&session.key)));
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(session)
            .map_err(|e| SwitchboardError::Persistence(format!("encode snapshot: {}", e)))?;

        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| SwitchboardError::Persistence(format!("write snapshot: {}", e)))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            warn!(session = %session.key, error = %e, "Snapshot rename failed");
            SwitchboardError::Persistence(format!("commit snapshot: {}", e))
        })?;
        Ok(())
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            cells: Arc::clone(&self.cells),
            storage_dir: self.storage_dir.clone(),
        }
    }
}

impl Default for SessionStore {
    /// Creates an in-memory store. Use `SessionStore::new()` for persistence.
    fn default() -> Self {
        Self::new_memory()
    }
}

/// Sanitize a session key for use as a filename.
///
/// Percent-encodes filesystem-hostile characters so the mapping is
/// bijective: distinct keys can never collide on one file.
fn sanitize_key(key: &str) -> String {
    let mut result = String::with_capacity(key.len() * 3);
    for c in key.chars() {
        match c {
            '/' => result.push_str("%2F"),
            '\\' => result.push_str("%5C"),
            ':' => result.push_str("%3A"),
            '*' => result.push_str("%2A"),
            '?' => result.push_str("%3F"),
            '"' => result.push_str("%22"),
            '<' => result.push_str("%3C"),
            '>' => result.push_str("%3E"),
            '|' => result.push_str("%7C"),
            '%' => result.push_str("%25"),
            c => result.push(c),
        }
    }
    result
}
