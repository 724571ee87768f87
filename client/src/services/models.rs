//! Available AI models.

use std::sync::Arc;

use tracing::instrument;

use super::{call, Operation};
use crate::auth::BearerToken;
use crate::schema::{Envelope, ModelsPayload};
use crate::transport::{ApiRequest, Transport};
use crate::Result;

#[derive(Clone)]
pub struct ModelsService {
    transport: Arc<dyn Transport>,
}

impl ModelsService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    #[instrument(skip(self, token))]
    pub async fn get_models(&self, token: &BearerToken) -> Result<Envelope<ModelsPayload>> {
        call(
            self.transport.as_ref(),
            Operation::GetModels,
            ApiRequest::get("/api/content/models"),
            token,
        )
        .await
    }
}
