//! Reference counts for remote images held by live entities.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Shared per-URL reference counts.
///
/// Cloning shares the counts, so a removal's cleanup callback can release
/// references after the entity has left the store.
#[derive(Debug, Clone, Default)]
pub struct AssetRefs {
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl AssetRefs {
    pub fn new() -> Self {
        Self::default()
    }

    fn counts(&self) -> MutexGuard<'_, HashMap<String, usize>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a reference. Returns the new count.
    pub fn acquire(&self, url: &str) -> usize {
        let mut counts = self.counts();
        let count = counts.entry(url.to_string()).or_insert(0);
        *count += 1;
        trace!("acquired asset {} ({})", url, count);
        *count
    }

    /// Drops a reference. Returns the remaining count; the entry is
    /// forgotten when it reaches zero.
    pub fn release(&self, url: &str) -> usize {
        let mut counts = self.counts();
        let Some(count) = counts.get_mut(url) else {
            return 0;
        };
        *count = count.saturating_sub(1);
        let remaining = *count;
        if remaining == 0 {
            counts.remove(url);
        }
        trace!("released asset {} ({})", url, remaining);
        remaining
    }

    pub fn count(&self, url: &str) -> usize {
        self.counts().get(url).copied().unwrap_or(0)
    }

    pub fn is_referenced(&self, url: &str) -> bool {
        self.count(url) > 0
    }

    /// Every URL with at least one reference, sorted.
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.counts().keys().cloned().collect();
        urls.sort();
        urls
    }

    /// Swaps one entity's references from `old` to `new`.
    pub(crate) fn swap(&self, old: &[String], new: &[String]) {
        for url in new {
            self.acquire(url);
        }
        for url in old {
            self.release(url);
        }
    }
}
