//! Usage analytics.

use std::sync::Arc;

use tracing::instrument;

use super::{call, Operation};
use crate::auth::BearerToken;
use crate::schema::{AnalyticsPayload, Envelope};
use crate::transport::{ApiRequest, Transport};
use crate::Result;

#[derive(Clone)]
pub struct AnalyticsService {
    transport: Arc<dyn Transport>,
}

impl AnalyticsService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    #[instrument(skip(self, token))]
    pub async fn get_analytics(&self, token: &BearerToken) -> Result<Envelope<AnalyticsPayload>> {
        call(
            self.transport.as_ref(),
            Operation::GetAnalytics,
            ApiRequest::get("/api/content/analytics"),
            token,
        )
        .await
    }
}
