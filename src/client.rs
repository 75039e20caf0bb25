//! HTTP collaborators for the study-room backend
//!
//! Adapters implementing the runtime traits over the backend's REST API.
//! All routes live under `{base_url}/api` and use bearer token auth.

mod error;
mod mentor;
mod rooms;
pub(crate) mod wire;


pub use error::{ClientError, ClientErrorKind};
pub use mentor::MentorClient;
pub use rooms::RoomClient;

use crate::feed::{ConversationId, Identity, Message};
use crate::runtime::{FeedSource, IdentityProvider, SubmitReceipt};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP plumbing: base URL, credentials, JSON handling
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(self.http.get(self.url(path))).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, &body));
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::decode(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for ApiClient {
    async fn current_identity(&self) -> Result<Identity, ClientError> {
        let user: wire::UserDto = self.get_json("/auth/me").await?;
        Ok(user.into())
    }
}

/// Logging wrapper for feed sources
pub struct LoggingSource {
    inner: Arc<dyn FeedSource>,
    label: &'static str,
}

impl LoggingSource {
    pub fn new(label: &'static str, inner: Arc<dyn FeedSource>) -> Self {
        Self { inner, label }
    }
}

#[async_trait]
impl FeedSource for LoggingSource {
    async fn fetch(&self, conversation: &ConversationId) -> Result<Vec<Message>, ClientError> {
        let start = std::time::Instant::now();
        let result = self.inner.fetch(conversation).await;
        match &result {
            Ok(messages) => tracing::debug!(
                source = self.label,
                %conversation,
                duration_ms = %start.elapsed().as_millis(),
                count = messages.len(),
                "Fetched feed"
            ),
            Err(e) => tracing::debug!(
                source = self.label,
                %conversation,
                duration_ms = %start.elapsed().as_millis(),
                kind = ?e.kind,
                error = %e,
                "Fetch failed"
            ),
        }
        result
    }

    async fn submit(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<SubmitReceipt, ClientError> {
        let start = std::time::Instant::now();
        let result = self.inner.submit(conversation, text).await;
        match &result {
            Ok(receipt) => tracing::info!(
                source = self.label,
                %conversation,
                duration_ms = %start.elapsed().as_millis(),
                confirmed = receipt.confirmed.is_some(),
                replies = receipt.replies.len(),
                "Message submitted"
            ),
            Err(e) => tracing::error!(
                source = self.label,
                %conversation,
                duration_ms = %start.elapsed().as_millis(),
                kind = ?e.kind,
                error = %e,
                "Submit failed"
            ),
        }
        result
    }
}
