//! Cached reads and invalidating writes on top of the services.
//!
//! A [`Query`] binds one service call to a [`QueryKey`] in the shared
//! [`QueryCache`]. A [`Mutation`] runs a write and then invalidates every
//! query family its [`MutationKind`] names.

mod cache;
mod mutation;

pub use cache::{QueryCache, DEFAULT_GC_TIME};
pub use mutation::{Mutation, MutationCallbacks, MutationKind};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::{Error, Result};

/// History and favorites are served from cache for this long.
pub const LIST_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Cache key: operation plus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Content(String),
    ContentHistory(Option<u32>),
    Favorites,
    Models,
    Analytics,
}

/// Group of keys invalidated together, regardless of parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    Content,
    ContentHistory,
    Favorites,
    Models,
    Analytics,
}

impl QueryKey {
    pub fn family(&self) -> QueryFamily {
        match self {
            QueryKey::Content(_) => QueryFamily::Content,
            QueryKey::ContentHistory(_) => QueryFamily::ContentHistory,
            QueryKey::Favorites => QueryFamily::Favorites,
            QueryKey::Models => QueryFamily::Models,
            QueryKey::Analytics => QueryFamily::Analytics,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Content(id) => write!(f, "content/{}", id),
            QueryKey::ContentHistory(Some(limit)) => write!(f, "contentHistory/{}", limit),
            QueryKey::ContentHistory(None) => f.write_str("contentHistory"),
            QueryKey::Favorites => f.write_str("favorites"),
            QueryKey::Models => f.write_str("models"),
            QueryKey::Analytics => f.write_str("analytics"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// When false the query never touches the network.
    pub enabled: bool,
    /// How long a successful result is served without revalidation.
    pub stale_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: Duration::ZERO,
        }
    }
}

impl QueryOptions {
    pub fn stale_after(stale_time: Duration) -> Self {
        Self {
            stale_time,
            ..Self::default()
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// What a consumer sees of a query at one moment.
#[derive(Debug)]
pub struct QueryState<T> {
    /// Last good value; kept while an error is shown.
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<Error>>,
    /// Fetching with nothing cached yet.
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_stale: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_fetching: false,
            is_stale: true,
        }
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
        }
    }
}

impl<T> QueryState<T> {
    /// The error if there is one, else whatever data is held. A disabled
    /// query yields `Ok(None)`.
    pub fn into_result(self) -> std::result::Result<Option<Arc<T>>, Arc<Error>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }
}

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Handle to one cached read.
pub struct Query<T> {
    key: QueryKey,
    options: QueryOptions,
    cache: QueryCache,
    fetcher: Fetcher<T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            options: self.options,
            cache: self.cache.clone(),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<T> Query<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new<F>(key: QueryKey, options: QueryOptions, cache: QueryCache, fetcher: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        Self {
            key,
            options,
            cache,
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn enabled(&self) -> bool {
        self.options.enabled
    }

    pub fn stale_time(&self) -> Duration {
        self.options.stale_time
    }

    /// Override the default options for this handle.
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Read through the cache.
    pub async fn fetch(&self) -> QueryState<T> {
        if !self.options.enabled {
            return self.state().await;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let result = self
            .cache
            .fetch(self.key.clone(), self.options.stale_time, move || fetcher())
            .await;

        let mut state = self.state().await;
        match result {
            Ok(data) => {
                state.data = Some(data);
                state.error = None;
            }
            Err(err) => state.error = Some(err),
        }
        state
    }

    /// Bypass freshness and wait for a new response.
    pub async fn refetch(&self) -> QueryState<T> {
        if self.options.enabled {
            self.cache.invalidate_key(&self.key).await;
        }
        self.fetch().await
    }

    /// Current cached state, without I/O.
    pub async fn state(&self) -> QueryState<T> {
        self.cache.snapshot(&self.key, self.options.stale_time).await
    }
}
