//! Single-flight, TTL-bounded cache in front of a bulk upstream call.
//!
//! Many typed readers (state of charge, range, charge status) share one
//! [`CachedBulk`]. A fresh snapshot is served straight from memory. When the
//! snapshot is missing or stale, the first caller becomes the leader and runs
//! the upstream fetch; everybody arriving while that fetch is running
//! subscribes to its outcome instead of issuing another call. Errors are
//! handed to the current waiters and then forgotten, so the next read fetches
//! again.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::cache::cache_entry::CacheEntry;
use crate::errors::VehicleError;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;

static ERROR_MSG: &str = "error";

/// Upstream call returning everything known about one entity.
pub trait BulkSource: Send + Sync + 'static {
    type Snapshot: Clone + Send + Sync + 'static;

    fn fetch(&self) -> impl Future<Output = Result<Self::Snapshot, VehicleError>> + Send;
}

type Outcome<T> = Result<T, VehicleError>;

struct State<T> {
    entry: Option<CacheEntry<T>>,
    in_flight: Option<broadcast::Sender<Outcome<T>>>,
}

enum Role<T> {
    Hit(T),
    Waiter(broadcast::Receiver<Outcome<T>>),
    Leader,
}

pub struct CachedBulk<S: BulkSource> {
    name: String,
    source: S,
    ttl: Duration,
    state: Mutex<State<S::Snapshot>>,
}

impl<S: BulkSource> CachedBulk<S> {
    /// No upstream call happens before the first [`CachedBulk::get`].
    pub fn new(name: impl Into<String>, source: S, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            source,
            ttl,
            state: Mutex::new(State {
                entry: None,
                in_flight: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current snapshot, fetched at most once per ttl window and at most once
    /// concurrently.
    pub async fn get(&self) -> Outcome<S::Snapshot> {
        let metrics = get_metrics().await;

        loop {
            match self.role() {
                Role::Hit(value) => {
                    metrics.cache_hits.with_label_values(&[self.name.as_str()]).inc();
                    return Ok(value);
                }
                Role::Waiter(mut receiver) => {
                    metrics.cache_coalesced.with_label_values(&[self.name.as_str()]).inc();
                    match receiver.recv().await {
                        Ok(outcome) => return outcome,
                        // leader was dropped before publishing, compete again
                        Err(_) => {
                            debug!(cache = %self.name, "in-flight fetch abandoned, retrying");
                            continue;
                        }
                    }
                }
                Role::Leader => return self.lead().await,
            }
        }
    }

    fn role(&self) -> Role<S::Snapshot> {
        let mut state = self.state.lock();

        if let Some(entry) = state.entry.as_ref().filter(|e| e.is_fresh(self.ttl)) {
            return Role::Hit(entry.value.clone());
        }
        if let Some(sender) = &state.in_flight {
            return Role::Waiter(sender.subscribe());
        }

        let (sender, _) = broadcast::channel(1);
        state.in_flight = Some(sender);
        Role::Leader
    }

    async fn lead(&self) -> Outcome<S::Snapshot> {
        let metrics = get_metrics().await;
        let mut guard = InFlightGuard {
            state: &self.state,
            published: false,
        };

        let start = get_instant();
        metrics.bulk_fetch_requests.with_label_values(&[self.name.as_str()]).inc();
        debug!(cache = %self.name, "fetching bulk snapshot");

        let outcome = self.source.fetch().await;

        metrics
            .bulk_fetch_duration
            .with_label_values(&[self.name.as_str()])
            .observe(start.elapsed().as_secs_f64());
        if let Err(err) = &outcome {
            warn!(cache = %self.name, error = %err, "bulk fetch failed");
            metrics
                .bulk_fetch_failures
                .with_label_values(&[self.name.as_str(), ERROR_MSG])
                .inc();
        }

        guard.publish(&outcome);
        outcome
    }
}

/// Owns the in-flight slot for the leader. Dropping it unpublished releases
/// the waiters so one of them can take over.
struct InFlightGuard<'a, T> {
    state: &'a Mutex<State<T>>,
    published: bool,
}

impl<T: Clone> InFlightGuard<'_, T> {
    fn publish(&mut self, outcome: &Outcome<T>) {
        let sender = {
            let mut state = self.state.lock();
            if let Ok(value) = outcome {
                state.entry = Some(CacheEntry::new(value.clone()));
            }
            state.in_flight.take()
        };
        self.published = true;

        if let Some(sender) = sender {
            // no receivers is fine
            let _ = sender.send(outcome.clone());
        }
    }
}

impl<T> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        if !self.published {
            self.state.lock().in_flight = None;
        }
    }
}
