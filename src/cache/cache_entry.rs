use std::time::Duration;

use tokio::time::Instant;

use crate::helpers::time::get_instant;

/// Last successfully fetched snapshot
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    /// fetch completion time
    pub fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: get_instant(),
        }
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Staleness is decided on read, nothing is evicted on write
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}
