//! Keyed counting store with window-native expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

/// Result of one atomic increment-and-read.
#[derive(Debug, Clone, Copy)]
pub struct WindowSnapshot {
    /// Count for the active window, including this request.
    pub count: u32,
    /// Time until the active window resets.
    pub resets_in: Duration,
}

/// Shared counting store boundary.
///
/// The store owns its internal concurrency control: two concurrent callers
/// sharing a key must never both observe a pre-increment count.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment_and_read(&self, key: &str, window: Duration) -> WindowSnapshot;
}

struct WindowEntry {
    count: u32,
    started: Instant,
    window: Duration,
}

/// In-process counting store backed by a sharded concurrent map.
///
/// The entry guard holds the shard write lock for the duration of the
/// increment, which makes increment-and-read atomic without any lock being
/// held across an await point. Windows expire lazily on access; a periodic
/// sweep reclaims entries nothing touches anymore.
#[derive(Default)]
pub struct MemoryCounterStore {
    windows: DashMap<String, WindowEntry>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose window elapsed and that were never re-keyed.
    pub fn sweep(&self) {
        self.windows
            .retain(|_, entry| entry.started.elapsed() < entry.window);
    }

    /// Spawn the background sweeper. The task exits with the runtime.
    pub fn spawn_sweeper(store: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                store.sweep();
            }
        })
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment_and_read(&self, key: &str, window: Duration) -> WindowSnapshot {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry {
                count: 0,
                started: Instant::now(),
                window,
            });

        let elapsed = entry.started.elapsed();
        if elapsed >= entry.window {
            entry.count = 0;
            entry.started = Instant::now();
            entry.window = window;
        }
        entry.count += 1;

        WindowSnapshot {
            count: entry.count,
            resets_in: entry.window.saturating_sub(entry.started.elapsed()),
        }
    }
}
