//! Content generation and per-item operations.

use std::sync::Arc;

use tracing::instrument;

use super::{call, Operation};
use crate::auth::BearerToken;
use crate::schema::{
    check_content_id, ContentPayload, DeletePayload, Envelope, FavoritesPayload,
    GeneratePayload, GenerateRequest, ToggleFavoritePayload,
};
use crate::transport::{ApiRequest, Transport};
use crate::Result;

/// Client for `/api/content` item endpoints.
#[derive(Clone)]
pub struct ContentService {
    transport: Arc<dyn Transport>,
}

impl ContentService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Generate content for a topic with the chosen model.
    #[instrument(skip(self, request, token), fields(model = %request.model))]
    pub async fn generate_content(
        &self,
        request: &GenerateRequest,
        token: &BearerToken,
    ) -> Result<Envelope<GeneratePayload>> {
        request.check()?;
        let body = serde_json::to_value(request)?;

        call(
            self.transport.as_ref(),
            Operation::GenerateContent,
            ApiRequest::post("/api/content/generate", body),
            token,
        )
        .await
    }

    #[instrument(skip(self, token))]
    pub async fn get_content_by_id(
        &self,
        id: &str,
        token: &BearerToken,
    ) -> Result<Envelope<ContentPayload>> {
        check_content_id(id)?;

        call(
            self.transport.as_ref(),
            Operation::GetContentById,
            ApiRequest::get(item_path(id)),
            token,
        )
        .await
    }

    /// Delete one item. Deleting an id twice yields whatever failure the
    /// server reports for the second call.
    #[instrument(skip(self, token))]
    pub async fn delete_content_by_id(
        &self,
        id: &str,
        token: &BearerToken,
    ) -> Result<Envelope<DeletePayload>> {
        check_content_id(id)?;

        call(
            self.transport.as_ref(),
            Operation::DeleteContentById,
            ApiRequest::delete(item_path(id)),
            token,
        )
        .await
    }

    /// Flip the favorite flag server-side; the success body is the updated item.
    #[instrument(skip(self, token))]
    pub async fn toggle_favorite_content(
        &self,
        id: &str,
        token: &BearerToken,
    ) -> Result<Envelope<ToggleFavoritePayload>> {
        check_content_id(id)?;

        call(
            self.transport.as_ref(),
            Operation::ToggleFavorite,
            ApiRequest::patch(format!("{}/favorite", item_path(id))),
            token,
        )
        .await
    }

    #[instrument(skip(self, token))]
    pub async fn get_favorites(&self, token: &BearerToken) -> Result<Envelope<FavoritesPayload>> {
        call(
            self.transport.as_ref(),
            Operation::GetFavorites,
            ApiRequest::get("/api/content/favorites"),
            token,
        )
        .await
    }
}

fn item_path(id: &str) -> String {
    format!("/api/content/{}", urlencoding::encode(id))
}
