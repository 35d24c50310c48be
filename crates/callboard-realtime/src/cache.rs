//! Query cache invalidation seam.
//!
//! The core never refetches anything itself. It only tells an external query
//! cache which named results have gone stale.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Named query results the core can invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKey {
    /// Call list.
    Calls,
    /// Live monitoring board.
    LiveMonitoring,
    /// Agent roster and status.
    Agents,
}

impl QueryKey {
    /// Query identifier understood by the cache.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKey::Calls => "calls",
            QueryKey::LiveMonitoring => "live-monitoring",
            QueryKey::Agents => "agents",
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External query cache.
pub trait QueryCache: Send + Sync {
    /// Mark the cached results for `key` as stale.
    fn invalidate(&self, key: QueryKey);
}

/// Invalidation requests kept by [`InvalidationLog`] unless configured otherwise.
pub const DEFAULT_INVALIDATION_CAPACITY: usize = 1000;

/// Cache stand-in that records invalidation requests.
///
/// Only the most recent `capacity` requests are kept; counts cover every
/// request ever made.
#[derive(Debug)]
pub struct InvalidationLog {
    capacity: usize,
    inner: RwLock<InvalidationHistory>,
}

#[derive(Debug, Default)]
struct InvalidationHistory {
    requests: VecDeque<QueryKey>,
    total: usize,
    by_key: HashMap<QueryKey, usize>,
}

impl Default for InvalidationLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_INVALIDATION_CAPACITY)
    }
}

impl InvalidationLog {
    /// Create an empty log with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log retaining at most `capacity` requests.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(InvalidationHistory::default()),
        }
    }

    /// Maximum number of retained requests.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained requests, in arrival order.
    pub fn requests(&self) -> Vec<QueryKey> {
        self.inner.read().requests.iter().copied().collect()
    }

    /// Number of requests ever made for `key`.
    pub fn count(&self, key: QueryKey) -> usize {
        self.inner.read().by_key.get(&key).copied().unwrap_or(0)
    }

    /// Request totals keyed by query identifier.
    pub fn counts(&self) -> HashMap<&'static str, usize> {
        self.inner
            .read()
            .by_key
            .iter()
            .map(|(key, count)| (key.as_str(), *count))
            .collect()
    }

    /// Total number of requests ever made.
    pub fn len(&self) -> usize {
        self.inner.read().total
    }

    /// Number of requests currently retained.
    pub fn retained(&self) -> usize {
        self.inner.read().requests.len()
    }

    /// Whether nothing has been invalidated.
    pub fn is_empty(&self) -> bool {
        self.inner.read().total == 0
    }
}

impl QueryCache for InvalidationLog {
    fn invalidate(&self, key: QueryKey) {
        let mut inner = self.inner.write();
        inner.total += 1;
        *inner.by_key.entry(key).or_insert(0) += 1;
        inner.requests.push_back(key);
        while inner.requests.len() > self.capacity {
            inner.requests.pop_front();
        }
    }
}
