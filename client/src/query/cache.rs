//! Process-wide query cache.
//!
//! Entries are keyed by [`QueryKey`] and hold type-erased data. At most one
//! request per key is in flight: concurrent readers share the same future.
//! Entries nobody has read for the garbage-collection time are dropped.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::RwLock;
use tracing::debug;

use super::{QueryFamily, QueryKey, QueryState};
use crate::{Error, Result};

type AnyData = Arc<dyn Any + Send + Sync>;
type FetchResult = std::result::Result<AnyData, Arc<Error>>;
type InFlight = Shared<BoxFuture<'static, FetchResult>>;

/// How long an unread entry is kept before it is collected.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    Fresh,
    Stale,
    Missing,
}

#[derive(Default)]
struct Entry {
    data: Option<AnyData>,
    updated_at: Option<Instant>,
    error: Option<Arc<Error>>,
    invalidated: bool,
    in_flight: Option<(u64, InFlight)>,
    last_access: Option<Instant>,
}

impl Entry {
    fn is_collectable(&self, gc_time: Duration) -> bool {
        self.in_flight.is_none()
            && self
                .last_access
                .map_or(true, |at| at.elapsed() >= gc_time)
    }

    fn freshness(&self, stale_time: Duration) -> Freshness {
        match (&self.data, self.updated_at) {
            (Some(_), Some(at)) if !self.invalidated && at.elapsed() < stale_time => {
                Freshness::Fresh
            }
            (Some(_), Some(_)) if !self.invalidated => Freshness::Stale,
            _ => Freshness::Missing,
        }
    }
}

/// Shared async cache behind every query handle.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, Entry>>>,
    next_fetch: Arc<AtomicU64>,
    gc_time: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self {
            entries: Arc::default(),
            next_fetch: Arc::default(),
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    /// Drop entries that are idle and unread for the gc time.
    /// Returns how many were removed.
    pub async fn collect_garbage(&self) -> usize {
        let mut entries = self.entries.write().await;
        sweep(&mut entries, self.gc_time, None)
    }

    /// Read `key`, fetching when needed.
    ///
    /// - fresh data is returned without I/O
    /// - missing or invalidated data is fetched and awaited
    /// - stale data is returned at once while a background refresh runs
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        stale_time: Duration,
        fetcher: F,
    ) -> std::result::Result<Arc<T>, Arc<Error>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (in_flight, stale_data) = {
            let mut entries = self.entries.write().await;
            sweep(&mut entries, self.gc_time, Some(&key));
            let entry = entries.entry(key.clone()).or_default();
            entry.last_access = Some(Instant::now());
            let freshness = entry.freshness(stale_time);

            if freshness == Freshness::Fresh {
                if let Some(data) = entry.data.clone() {
                    debug!(key = %key, "Query cache hit");
                    return downcast(&key, data);
                }
            }

            let joined = entry.in_flight.as_ref().map(|(_, shared)| shared.clone());
            let in_flight = match joined {
                Some(shared) => {
                    debug!(key = %key, "Joining in-flight query");
                    shared
                }
                None => {
                    debug!(key = %key, freshness = ?freshness, "Query cache miss, fetching");
                    self.start_fetch(key.clone(), entry, fetcher())
                }
            };

            let stale_data = match freshness {
                Freshness::Stale => entry.data.clone(),
                _ => None,
            };
            (in_flight, stale_data)
        };

        if let Some(data) = stale_data {
            // Stale-while-revalidate: the refresh must progress without a reader.
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(in_flight.map(|_| ()));
            }
            return downcast(&key, data);
        }

        let data = in_flight.await?;
        downcast(&key, data)
    }

    fn start_fetch<T, Fut>(&self, key: QueryKey, entry: &mut Entry, fut: Fut) -> InFlight
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let fetch_id = self.next_fetch.fetch_add(1, Ordering::Relaxed);
        let entries = Arc::downgrade(&self.entries);

        let shared = async move {
            let result: FetchResult = fut
                .await
                .map(|value| Arc::new(value) as AnyData)
                .map_err(Arc::new);

            let Some(entries) = entries.upgrade() else {
                return result;
            };
            let mut entries = entries.write().await;
            if let Some(entry) = entries.get_mut(&key) {
                // Only the fetch the entry is still waiting on may write; an
                // invalidation or clear in the meantime detached this one.
                if matches!(entry.in_flight, Some((id, _)) if id == fetch_id) {
                    entry.in_flight = None;
                    entry.last_access = Some(Instant::now());
                    match &result {
                        Ok(data) => {
                            entry.data = Some(Arc::clone(data));
                            entry.updated_at = Some(Instant::now());
                            entry.error = None;
                            entry.invalidated = false;
                        }
                        Err(err) => {
                            debug!(key = %key, error = %err, "Query fetch failed");
                            entry.error = Some(Arc::clone(err));
                        }
                    }
                }
            }
            result
        }
        .boxed()
        .shared();

        entry.in_flight = Some((fetch_id, shared.clone()));
        shared
    }

    /// Mark every entry of `family` as no longer authoritative.
    pub async fn invalidate(&self, family: QueryFamily) {
        let mut entries = self.entries.write().await;
        let mut count = 0usize;
        for (key, entry) in entries.iter_mut() {
            if key.family() == family {
                entry.invalidated = true;
                entry.in_flight = None;
                count += 1;
            }
        }
        debug!(family = ?family, entries = count, "Invalidated queries");
    }

    pub async fn invalidate_key(&self, key: &QueryKey) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.invalidated = true;
            entry.in_flight = None;
        }
    }

    /// Current state of `key` without any I/O.
    pub async fn snapshot<T>(&self, key: &QueryKey, stale_time: Duration) -> QueryState<T>
    where
        T: Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) => {
                let data = entry
                    .data
                    .clone()
                    .and_then(|data| data.downcast::<T>().ok());
                let is_fetching = entry.in_flight.is_some();
                QueryState {
                    is_loading: is_fetching && data.is_none(),
                    is_fetching,
                    is_stale: entry.freshness(stale_time) != Freshness::Fresh,
                    data,
                    error: entry.error.clone(),
                }
            }
            None => QueryState::default(),
        }
    }

    /// Drop every entry, e.g. on sign-out.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        debug!("Query cache cleared");
    }
}

fn sweep(
    entries: &mut HashMap<QueryKey, Entry>,
    gc_time: Duration,
    keep: Option<&QueryKey>,
) -> usize {
    let before = entries.len();
    entries.retain(|key, entry| Some(key) == keep || !entry.is_collectable(gc_time));
    let removed = before - entries.len();
    if removed > 0 {
        debug!(removed, "Collected idle queries");
    }
    removed
}

fn downcast<T>(key: &QueryKey, data: AnyData) -> std::result::Result<Arc<T>, Arc<Error>>
where
    T: Send + Sync + 'static,
{
    data.downcast::<T>().map_err(|_| {
        Arc::new(Error::Internal(format!(
            "Cached value for {} has an unexpected type",
            key
        )))
    })
}
