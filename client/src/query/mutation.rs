use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{info, warn};

use super::{QueryCache, QueryFamily};
use crate::{Error, Result};

/// Every write the client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    GenerateContent,
    DeleteContent,
    ToggleFavorite,
}

impl MutationKind {
    /// Query families whose cached values a successful write may have changed.
    pub fn invalidates(self) -> &'static [QueryFamily] {
        match self {
            MutationKind::GenerateContent => {
                &[QueryFamily::ContentHistory, QueryFamily::Analytics]
            }
            MutationKind::DeleteContent | MutationKind::ToggleFavorite => &[
                QueryFamily::Content,
                QueryFamily::ContentHistory,
                QueryFamily::Favorites,
                QueryFamily::Analytics,
            ],
        }
    }
}

type SuccessCallback<R> = Box<dyn FnOnce(&R) + Send>;
type ErrorCallback = Box<dyn FnOnce(&Error) + Send>;

/// Caller hooks run after a mutation settles.
pub struct MutationCallbacks<R> {
    on_success: Option<SuccessCallback<R>>,
    on_error: Option<ErrorCallback>,
}

impl<R> Default for MutationCallbacks<R> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

impl<R> MutationCallbacks<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs after the affected queries have been invalidated.
    pub fn on_success(mut self, f: impl FnOnce(&R) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&Error) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

type Runner<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<R>> + Send + Sync>;

/// Handle to one kind of write.
pub struct Mutation<A, R> {
    kind: MutationKind,
    cache: QueryCache,
    runner: Runner<A, R>,
    pending: Arc<AtomicUsize>,
}

impl<A, R> Clone for Mutation<A, R> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            cache: self.cache.clone(),
            runner: Arc::clone(&self.runner),
            pending: Arc::clone(&self.pending),
        }
    }
}

struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<A, R> Mutation<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    pub(crate) fn new<F>(kind: MutationKind, cache: QueryCache, runner: F) -> Self
    where
        F: Fn(A) -> BoxFuture<'static, Result<R>> + Send + Sync + 'static,
    {
        Self {
            kind,
            cache,
            runner: Arc::new(runner),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Whether any call through this handle (or its clones) is running.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Run the write, invalidate what it touched, then call back.
    ///
    /// The request and the invalidation run on their own task, so dropping
    /// the returned future does not abort them; it only skips the callbacks.
    pub async fn mutate(&self, args: A, callbacks: MutationCallbacks<R>) -> Result<R> {
        let kind = self.kind;
        let cache = self.cache.clone();
        let work = (self.runner)(args);
        let guard = PendingGuard::enter(&self.pending);

        let task = tokio::spawn(async move {
            let _guard = guard;
            let result = work.await;
            if result.is_ok() {
                for family in kind.invalidates() {
                    cache.invalidate(*family).await;
                }
            }
            result
        });

        let result = task
            .await
            .map_err(|e| Error::Internal(format!("Mutation task failed: {}", e)))
            .and_then(|result| result);

        match &result {
            Ok(value) => {
                info!(mutation = ?kind, "Mutation succeeded");
                if let Some(on_success) = callbacks.on_success {
                    on_success(value);
                }
            }
            Err(err) => {
                warn!(mutation = ?kind, error = %err, "Mutation failed");
                if let Some(on_error) = callbacks.on_error {
                    on_error(err);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryKey;
    use futures::FutureExt;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_invalidation_table() {
        let generate = MutationKind::GenerateContent.invalidates();
        assert!(generate.contains(&QueryFamily::ContentHistory));
        assert!(!generate.contains(&QueryFamily::Favorites));

        for kind in [MutationKind::DeleteContent, MutationKind::ToggleFavorite] {
            assert!(kind.invalidates().contains(&QueryFamily::ContentHistory));
            assert!(kind.invalidates().contains(&QueryFamily::Favorites));
        }
        assert!(!MutationKind::ToggleFavorite
            .invalidates()
            .contains(&QueryFamily::Models));
    }

    #[tokio::test]
    async fn test_invalidates_before_on_success() {
        let cache = QueryCache::new();
        let stale = Duration::from_secs(300);
        cache
            .fetch(QueryKey::Favorites, stale, || async { Ok(1u32) })
            .await
            .unwrap();

        let mutation: Mutation<(), &'static str> =
            Mutation::new(MutationKind::ToggleFavorite, cache.clone(), |_| {
                async { Ok("done") }.boxed()
            });

        let seen_stale = Arc::new(Mutex::new(None));
        let observed = Arc::clone(&seen_stale);
        let probe = cache.clone();
        let result = mutation
            .mutate(
                (),
                MutationCallbacks::new().on_success(move |_| {
                    // Uncontended, so this resolves without yielding.
                    let state = futures::executor::block_on(
                        probe.snapshot::<u32>(&QueryKey::Favorites, stale),
                    );
                    *observed.lock().unwrap() = Some(state.is_stale);
                }),
            )
            .await
            .unwrap();

        assert_eq!(result, "done");
        assert_eq!(*seen_stale.lock().unwrap(), Some(true));
        assert!(!mutation.is_pending());
    }

    #[tokio::test]
    async fn test_failure_skips_invalidation() {
        let cache = QueryCache::new();
        let stale = Duration::from_secs(300);
        cache
            .fetch(QueryKey::Favorites, stale, || async { Ok(1u32) })
            .await
            .unwrap();

        let mutation: Mutation<(), ()> =
            Mutation::new(MutationKind::DeleteContent, cache.clone(), |_| {
                async { Err(Error::AuthRequired) }.boxed()
            });

        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let err = mutation
            .mutate(
                (),
                MutationCallbacks::new().on_error(move |e| sink.lock().unwrap().push(e.to_string())),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AuthRequired));
        assert_eq!(*errors.lock().unwrap(), vec!["User not authenticated".to_string()]);
        assert!(!cache.snapshot::<u32>(&QueryKey::Favorites, stale).await.is_stale);
    }

    #[tokio::test]
    async fn test_pending_while_running() {
        let mutation: Mutation<(), ()> =
            Mutation::new(MutationKind::GenerateContent, QueryCache::new(), |_| {
                async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(())
                }
                .boxed()
            });

        let running = {
            let mutation = mutation.clone();
            tokio::spawn(async move { mutation.mutate((), MutationCallbacks::new()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(mutation.is_pending());

        running.await.unwrap().unwrap();
        assert!(!mutation.is_pending());
    }
}
