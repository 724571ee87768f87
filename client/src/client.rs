//! The client facade: cached queries and invalidating mutations.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;

use crate::auth::{inspect_token, BearerToken, EnvTokenSource, SessionUser, TokenSource};
use crate::config::Config;
use crate::query::{
    Mutation, MutationKind, Query, QueryCache, QueryKey, QueryOptions, LIST_STALE_TIME,
};
use crate::schema::{
    AnalyticsPayload, ContentPayload, DeletePayload, FavoritesPayload, GeneratePayload,
    GenerateRequest, HistoryPayload, HistoryQuery, ModelsPayload, ToggleFavoritePayload,
};
use crate::services::{AnalyticsService, ContentService, HistoryService, ModelsService};
use crate::transport::{HttpTransport, Transport};
use crate::{Error, Result};

/// Entry point for every TubeGenie operation.
///
/// Cloning is cheap and clones share one cache. Each execution asks the
/// [`TokenSource`] for a token just before the request goes out.
#[derive(Clone)]
pub struct ApiClient {
    content: ContentService,
    history: HistoryService,
    models: ModelsService,
    analytics: AnalyticsService,
    tokens: Arc<dyn TokenSource>,
    cache: QueryCache,
}

/// A missing or blank token never reaches the transport.
async fn authorize(tokens: &dyn TokenSource) -> Result<BearerToken> {
    match tokens.get_token().await {
        Some(token) if !token.as_str().trim().is_empty() => Ok(token),
        _ => Err(Error::AuthRequired),
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            content: ContentService::new(Arc::clone(&transport)),
            history: HistoryService::new(Arc::clone(&transport)),
            models: ModelsService::new(Arc::clone(&transport)),
            analytics: AnalyticsService::new(transport),
            tokens,
            cache: QueryCache::new(),
        }
    }

    /// HTTP transport plus the token read from `config.token_var`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        let tokens = EnvTokenSource::new(config.token_var.clone());
        Ok(Self::new(Arc::new(transport), Arc::new(tokens)))
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Claims of the current token, or `None` when signed out.
    pub async fn current_user(&self) -> Result<Option<SessionUser>> {
        match authorize(self.tokens.as_ref()).await {
            Ok(token) => inspect_token(&token).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Forget every cached value, e.g. after the user signs out.
    pub async fn sign_out(&self) {
        self.cache.clear().await;
    }

    fn query<T, S, F, Fut>(&self, key: QueryKey, options: QueryOptions, service: S, call: F) -> Query<T>
    where
        T: Send + Sync + 'static,
        S: Clone + Send + Sync + 'static,
        F: Fn(S, BearerToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let tokens = Arc::clone(&self.tokens);
        let call = Arc::new(call);
        Query::new(key, options, self.cache.clone(), move || {
            let tokens = Arc::clone(&tokens);
            let service = service.clone();
            let call = Arc::clone(&call);
            async move {
                let token = authorize(tokens.as_ref()).await?;
                call(service, token).await
            }
            .boxed()
        })
    }

    fn mutation<A, R, S, F, Fut>(&self, kind: MutationKind, service: S, call: F) -> Mutation<A, R>
    where
        A: Send + 'static,
        R: Send + 'static,
        S: Clone + Send + Sync + 'static,
        F: Fn(S, A, BearerToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        let tokens = Arc::clone(&self.tokens);
        let call = Arc::new(call);
        Mutation::new(kind, self.cache.clone(), move |args: A| {
            let tokens = Arc::clone(&tokens);
            let service = service.clone();
            let call = Arc::clone(&call);
            async move {
                let token = authorize(tokens.as_ref()).await?;
                call(service, args, token).await
            }
            .boxed()
        })
    }

    /// One item. Disabled while `id` is empty.
    pub fn content_by_id(&self, id: impl Into<String>) -> Query<ContentPayload> {
        let id = id.into();
        let options = QueryOptions::default().enabled(!id.is_empty());
        let key = QueryKey::Content(id.clone());
        self.query(key, options, self.content.clone(), move |service: ContentService, token| {
            let id = id.clone();
            async move { service.get_content_by_id(&id, &token).await?.into_body() }
        })
    }

    pub fn content_history(&self, limit: Option<u32>) -> Query<HistoryPayload> {
        let query = HistoryQuery { limit };
        self.query(
            QueryKey::ContentHistory(limit),
            QueryOptions::stale_after(LIST_STALE_TIME),
            self.history.clone(),
            move |service: HistoryService, token| async move {
                service.get_content_history(&query, &token).await?.into_body()
            },
        )
    }

    pub fn favorites(&self) -> Query<FavoritesPayload> {
        self.query(
            QueryKey::Favorites,
            QueryOptions::stale_after(LIST_STALE_TIME),
            self.content.clone(),
            |service: ContentService, token| async move {
                service.get_favorites(&token).await?.into_body()
            },
        )
    }

    pub fn models(&self) -> Query<ModelsPayload> {
        self.query(
            QueryKey::Models,
            QueryOptions::default(),
            self.models.clone(),
            |service: ModelsService, token| async move {
                service.get_models(&token).await?.into_body()
            },
        )
    }

    pub fn analytics(&self) -> Query<AnalyticsPayload> {
        self.query(
            QueryKey::Analytics,
            QueryOptions::default(),
            self.analytics.clone(),
            |service: AnalyticsService, token| async move {
                service.get_analytics(&token).await?.into_body()
            },
        )
    }

    pub fn generate_content(&self) -> Mutation<GenerateRequest, GeneratePayload> {
        self.mutation(
            MutationKind::GenerateContent,
            self.content.clone(),
            |service: ContentService, request: GenerateRequest, token| async move {
                service.generate_content(&request, &token).await?.into_body()
            },
        )
    }

    /// Takes the content id.
    pub fn delete_content(&self) -> Mutation<String, DeletePayload> {
        self.mutation(
            MutationKind::DeleteContent,
            self.content.clone(),
            |service: ContentService, id: String, token| async move {
                service.delete_content_by_id(&id, &token).await?.into_body()
            },
        )
    }

    /// Takes the content id; resolves to the updated item.
    pub fn toggle_favorite(&self) -> Mutation<String, ToggleFavoritePayload> {
        self.mutation(
            MutationKind::ToggleFavorite,
            self.content.clone(),
            |service: ContentService, id: String, token| async move {
                service.toggle_favorite_content(&id, &token).await?.into_body()
            },
        )
    }
}
