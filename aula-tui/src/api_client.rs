//! REST client for the school administration backend.
//!
//! Every resource lives under `{api_base_url}/{collection}`; single records
//! under `{collection}/{id}`. The client is generic over [`Resource`] so the
//! six screens share one implementation.

use crate::config::TuiConfig;
use aula_core::{Drafted, EntityId, FetchError, Resource, StatusChange};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(String),
}

impl From<ApiClientError> for FetchError {
    fn from(err: ApiClientError) -> Self {
        match err {
            ApiClientError::Status { status, message } => FetchError::status(status, message),
            ApiClientError::Http(err) if err.is_decode() => FetchError::decode(err.to_string()),
            ApiClientError::Http(err) => match err.status() {
                Some(status) => FetchError::status(status.as_u16(), err.to_string()),
                None => FetchError::network(err.to_string()),
            },
            ApiClientError::Serde(err) => FetchError::decode(err.to_string()),
            ApiClientError::Config(message) => FetchError::network(message),
        }
    }
}

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Message to show for a failed response: the backend's `message` (or
/// `error`) field when the body is JSON, the raw body otherwise.
pub fn error_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status)
    } else {
        trimmed.to_string()
    }
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &!self.auth_header.is_empty())
            .finish()
    }
}

impl RestClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let auth_header = build_auth_headers(config.auth.bearer_token.as_deref())?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn collection_url<R: Resource>(&self) -> String {
        format!("{}/{}", self.base_url, R::COLLECTION)
    }

    pub fn record_url<R: Resource>(&self, id: EntityId) -> String {
        format!("{}/{}/{}", self.base_url, R::COLLECTION, id)
    }

    pub async fn list<R: Resource>(&self) -> Result<Vec<R>, ApiClientError> {
        let url = self.collection_url::<R>();
        tracing::debug!(resource = R::COLLECTION, "GET collection");
        let response = self
            .client
            .get(url)
            .headers(self.auth_header.clone())
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn get<R: Resource>(&self, id: EntityId) -> Result<R, ApiClientError> {
        let url = self.record_url::<R>(id);
        tracing::debug!(resource = R::COLLECTION, id, "GET record");
        let response = self
            .client
            .get(url)
            .headers(self.auth_header.clone())
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn create<R, D>(&self, draft: &D) -> Result<R, ApiClientError>
    where
        R: Resource,
        D: Serialize + ?Sized,
    {
        let url = self.collection_url::<R>();
        tracing::debug!(resource = R::COLLECTION, "POST record");
        let response = self
            .client
            .post(url)
            .headers(self.auth_header.clone())
            .json(draft)
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn update<R, B>(&self, id: EntityId, body: &B) -> Result<R, ApiClientError>
    where
        R: Resource,
        B: Serialize + ?Sized,
    {
        let url = self.record_url::<R>(id);
        tracing::debug!(resource = R::COLLECTION, id, "PUT record");
        let response = self
            .client
            .put(url)
            .headers(self.auth_header.clone())
            .json(body)
            .send()
            .await?;
        parse_response(response).await
    }

    /// `PATCH {collection}/{id}` with `{"estado": ...}`.
    pub async fn set_status<R: Resource>(&self, change: StatusChange) -> Result<R, ApiClientError> {
        let url = self.record_url::<R>(change.id);
        let response = self
            .client
            .patch(url)
            .headers(self.auth_header.clone())
            .json(&change)
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn delete<R: Resource>(&self, id: EntityId) -> Result<(), ApiClientError> {
        let url = self.record_url::<R>(id);
        tracing::debug!(resource = R::COLLECTION, id, "DELETE record");
        let response = self
            .client
            .delete(url)
            .headers(self.auth_header.clone())
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    /// Loader for the whole collection of `R`, for a list query.
    pub fn list_loader<R: Resource>(
        &self,
    ) -> impl Fn() -> BoxedFetch<Vec<R>> + Send + Sync + 'static {
        let client = self.clone();
        move || {
            let client = client.clone();
            let fetch: BoxedFetch<Vec<R>> =
                Box::pin(async move { client.list::<R>().await.map_err(FetchError::from) });
            fetch
        }
    }

    /// Loader for one record of `R`, for a detail query.
    pub fn detail_loader<R: Resource>(
        &self,
        id: EntityId,
    ) -> impl Fn() -> BoxedFetch<R> + Send + Sync + 'static {
        let client = self.clone();
        move || {
            let client = client.clone();
            let fetch: BoxedFetch<R> =
                Box::pin(async move { client.get::<R>(id).await.map_err(FetchError::from) });
            fetch
        }
    }

    /// Create operation for `R`, for a mutation.
    pub fn create_operation<R: Drafted>(
        &self,
    ) -> impl Fn(R::Draft) -> BoxedFetch<R> + Send + Sync + 'static {
        let client = self.clone();
        move |draft: R::Draft| {
            let client = client.clone();
            let fetch: BoxedFetch<R> = Box::pin(async move {
                client.create::<R, _>(&draft).await.map_err(FetchError::from)
            });
            fetch
        }
    }

    /// Full update operation for `R`, for a mutation.
    pub fn update_operation<R: Drafted>(
        &self,
    ) -> impl Fn((EntityId, R::Draft)) -> BoxedFetch<R> + Send + Sync + 'static {
        let client = self.clone();
        move |(id, draft): (EntityId, R::Draft)| {
            let client = client.clone();
            let fetch: BoxedFetch<R> = Box::pin(async move {
                client.update::<R, _>(id, &draft).await.map_err(FetchError::from)
            });
            fetch
        }
    }

    /// Delete operation for `R`, for a mutation.
    pub fn delete_operation<R: Resource>(
        &self,
    ) -> impl Fn(EntityId) -> BoxedFetch<()> + Send + Sync + 'static {
        let client = self.clone();
        move |id: EntityId| {
            let client = client.clone();
            let fetch: BoxedFetch<()> =
                Box::pin(async move { client.delete::<R>(id).await.map_err(FetchError::from) });
            fetch
        }
    }

    /// Status update operation for `R`, for a mutation.
    pub fn status_operation<R: Resource>(
        &self,
    ) -> impl Fn(StatusChange) -> BoxedFetch<R> + Send + Sync + 'static {
        let client = self.clone();
        move |change: StatusChange| {
            let client = client.clone();
            let fetch: BoxedFetch<R> = Box::pin(async move {
                client.set_status::<R>(change).await.map_err(FetchError::from)
            });
            fetch
        }
    }
}

/// Boxed future returned by the loader and operation adapters.
pub type BoxedFetch<T> =
    std::pin::Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'static>>;

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status.as_u16(), &body);
    tracing::warn!(status = status.as_u16(), message = %message, "Backend rejected request");
    Err(ApiClientError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiClientError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn build_auth_headers(bearer_token: Option<&str>) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = bearer_token {
        let value = format!("Bearer {}", token.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
