//! Domain services, one per API resource.
//!
//! Every call follows the same lifecycle: validate the request, send it with
//! the caller's token, validate the response envelope, and hand the envelope
//! back unchanged. Branching on `success` is the caller's job.

mod analytics;
mod content;
mod history;
mod models;

pub use analytics::AnalyticsService;
pub use content::ContentService;
pub use history::HistoryService;
pub use models::ModelsService;

use std::fmt;

use tracing::{info, warn};

use crate::auth::BearerToken;
use crate::schema::{ApiFailure, Envelope, Schema};
use crate::transport::{ApiRequest, Transport, TransportError};
use crate::{Error, Result};

/// Remote operations, named the way failures are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GenerateContent,
    GetContentById,
    DeleteContentById,
    ToggleFavorite,
    GetFavorites,
    GetContentHistory,
    GetModels,
    GetAnalytics,
}

impl Operation {
    /// Verb phrase used in `Failed to <description>: ...`.
    pub fn description(self) -> &'static str {
        match self {
            Operation::GenerateContent => "generate content",
            Operation::GetContentById => "fetch content",
            Operation::DeleteContentById => "delete content",
            Operation::ToggleFavorite => "toggle favorite",
            Operation::GetFavorites => "fetch favorites",
            Operation::GetContentHistory => "fetch content history",
            Operation::GetModels => "fetch models",
            Operation::GetAnalytics => "fetch analytics",
        }
    }

    fn transport_error(self, err: TransportError) -> Error {
        match err {
            TransportError::Network(message) => Error::Transport {
                operation: self.description(),
                status: None,
                message,
            },
            TransportError::Status { status, body } => {
                // Prefer the server's own explanation when it sent an error envelope.
                let message = serde_json::from_value::<ApiFailure>(body)
                    .map(|failure| failure.error)
                    .unwrap_or_else(|_| format!("Request failed with status code {}", status));
                Error::Transport {
                    operation: self.description(),
                    status: Some(status),
                    message,
                }
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Send `request` and validate the response envelope.
pub(crate) async fn call<T>(
    transport: &dyn Transport,
    operation: Operation,
    request: ApiRequest,
    token: &BearerToken,
) -> Result<Envelope<T>>
where
    Envelope<T>: Schema,
{
    let response = transport
        .execute(request, token)
        .await
        .map_err(|e| operation.transport_error(e))?;

    let envelope = Envelope::<T>::parse(&response.body).map_err(|e| {
        warn!(operation = %operation, error = %e, "Response failed schema validation");
        Error::Validation(e)
    })?;

    if let Envelope::Failure(failure) = &envelope {
        info!(operation = %operation, error = %failure.error, "API reported failure");
    }

    Ok(envelope)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable in-memory transport.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::auth::BearerToken;
    use crate::transport::{ApiRequest, RawResponse, Transport, TransportError};

    type Reply = std::result::Result<RawResponse, TransportError>;
    type Handler = Box<dyn Fn(&ApiRequest) -> Reply + Send + Sync>;

    /// Records every request and answers from a handler.
    pub(crate) struct MockTransport {
        handler: Handler,
        queued: Mutex<VecDeque<Reply>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(ApiRequest, String)>>,
    }

    impl MockTransport {
        pub(crate) fn new(handler: impl Fn(&ApiRequest) -> Reply + Send + Sync + 'static) -> Self {
            Self {
                handler: Box::new(handler),
                queued: Mutex::new(VecDeque::new()),
                delay: None,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn replying(body: Value) -> Self {
            Self::new(move |_| Ok(ok(body.clone())))
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Reply used once, before falling back to the handler.
        pub(crate) fn queue(&self, reply: Reply) {
            self.queued.lock().unwrap().push_back(reply);
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn requests(&self) -> Vec<(ApiRequest, String)> {
            self.seen.lock().unwrap().clone()
        }

        pub(crate) fn shared(self) -> Arc<Self> {
            Arc::new(self)
        }
    }

    pub(crate) fn ok(body: Value) -> RawResponse {
        RawResponse { status: 200, body }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(
            &self,
            request: ApiRequest,
            token: &BearerToken,
        ) -> std::result::Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((request.clone(), token.as_str().to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let queued = self.queued.lock().unwrap().pop_front();
            match queued {
                Some(reply) => reply,
                None => (self.handler)(&request),
            }
        }
    }
}
