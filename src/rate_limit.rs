use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_WINDOW_SECS: u64 = 600;
pub const DEFAULT_MAX_SUBMISSIONS: usize = 5;

/// Millisecond clock behind the limiter, swappable in tests.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Clock pinned to an explicit instant, advanced by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta: u64) {
        self.now_ms.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, delta: u64) {
        self.advance_ms(delta * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Persisted list of successful-submission timestamps (epoch ms).
///
/// Read whole and rewritten whole; the limiter filters expired entries
/// on read but never prunes the stored list.
pub trait SubmissionStore: Send + Sync {
    fn read(&self) -> Result<Vec<u64>>;
    fn write(&self, timestamps: &[u64]) -> Result<()>;
}

/// Store backed by a JSON file of epoch-millisecond integers.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SubmissionStore for FileStore {
    fn read(&self) -> Result<Vec<u64>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read submission store: {}", self.path.display()))?;
        let timestamps: Vec<u64> = serde_json::from_str(&content).with_context(|| {
            format!("Failed to parse submission store: {}", self.path.display())
        })?;
        Ok(timestamps)
    }

    fn write(&self, timestamps: &[u64]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }
        let content = serde_json::to_string(timestamps)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write submission store: {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamps(timestamps: &[u64]) -> Self {
        Self {
            entries: Mutex::new(timestamps.to_vec()),
        }
    }
}

impl SubmissionStore for MemoryStore {
    fn read(&self) -> Result<Vec<u64>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    fn write(&self, timestamps: &[u64]) -> Result<()> {
        *self.entries.lock().unwrap() = timestamps.to_vec();
        Ok(())
    }
}

/// Sliding-window counter over successful submissions.
///
/// A store read that fails opens the gate rather than locking a user
/// out on a broken store. The check-then-record sequence is not
/// transactional, so independent processes can race past the limit.
pub struct RateLimiter {
    store: Arc<dyn SubmissionStore>,
    clock: Arc<dyn Clock>,
    window_ms: u64,
    max_submissions: usize,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        clock: Arc<dyn Clock>,
        window_secs: u64,
        max_submissions: usize,
    ) -> Self {
        Self {
            store,
            clock,
            window_ms: window_secs * 1000,
            max_submissions,
        }
    }

    /// True when the trailing window already holds the maximum number
    /// of successful submissions.
    pub fn is_limited(&self) -> bool {
        self.recent().len() >= self.max_submissions
    }

    /// Seconds until the oldest blocking entry leaves the window, when
    /// currently limited. A zero cap blocks permanently and carries no
    /// hint.
    pub fn retry_after_secs(&self) -> Option<u64> {
        // With a zero cap there is no entry whose expiry lifts the limit.
        if self.max_submissions == 0 {
            return None;
        }
        let mut recent = self.recent();
        if recent.len() < self.max_submissions {
            return None;
        }
        recent.sort_unstable();
        // The entry whose expiry brings the window back under the cap.
        let blocking = recent[recent.len() - self.max_submissions];
        let free_at = blocking + self.window_ms;
        let wait_ms = free_at.saturating_sub(self.clock.now_ms());
        Some(wait_ms.div_ceil(1000))
    }

    /// Append "now" to the store. Called only after the remote endpoint
    /// confirmed the submission.
    pub fn record(&self) -> Result<()> {
        let mut timestamps = match self.store.read() {
            Ok(timestamps) => timestamps,
            Err(e) => {
                log::warn!("Submission store read failed, starting a fresh list: {e}");
                Vec::new()
            }
        };
        timestamps.push(self.clock.now_ms());
        self.store.write(&timestamps)
    }

    fn recent(&self) -> Vec<u64> {
        let timestamps = match self.store.read() {
            Ok(timestamps) => timestamps,
            Err(e) => {
                log::warn!("Submission store read failed, skipping rate-limit check: {e}");
                return Vec::new();
            }
        };
        let now = self.clock.now_ms();
        timestamps
            .into_iter()
            .filter(|ts| now.saturating_sub(*ts) < self.window_ms)
            .collect()
    }
}
