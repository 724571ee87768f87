//! Content history listing.

use std::sync::Arc;

use tracing::instrument;

use super::{call, Operation};
use crate::auth::BearerToken;
use crate::schema::{Envelope, HistoryPayload, HistoryQuery};
use crate::transport::{ApiRequest, Transport};
use crate::Result;

#[derive(Clone)]
pub struct HistoryService {
    transport: Arc<dyn Transport>,
}

impl HistoryService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Recent content, newest first. `limit` is only sent when set.
    #[instrument(skip(self, token))]
    pub async fn get_content_history(
        &self,
        query: &HistoryQuery,
        token: &BearerToken,
    ) -> Result<Envelope<HistoryPayload>> {
        query.check()?;

        let mut request = ApiRequest::get("/api/content/history");
        if let Some(limit) = query.limit {
            request = request.with_query("limit", limit);
        }

        call(
            self.transport.as_ref(),
            Operation::GetContentHistory,
            request,
            token,
        )
        .await
    }
}
