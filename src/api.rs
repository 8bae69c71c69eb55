//! Client for the upstream episodes API.
//!
//! The API is json-server shaped: `GET /episodes` lists episodes (sorting and
//! paging through `_sort`, `_order` and `_limit`), `GET /episodes/{id}` returns
//! one.

use std::time::Duration;

use log::{debug, error};
use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::time::PublishedAt;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:3333`. A trailing `/` is ignored.
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("couldn't build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("{endpoint} not found")]
    NotFound { endpoint: String },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ListQuery {
    #[serde(rename = "_limit")]
    pub limit: u32,
    #[serde(rename = "_sort")]
    pub sort: &'static str,
    #[serde(rename = "_order")]
    pub order: &'static str,
}

impl ListQuery {
    /// Newest first, `limit` episodes.
    pub fn latest(limit: u32) -> Self {
        Self {
            limit,
            sort: "published_at",
            order: "desc",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEpisode {
    pub id: String,
    pub title: String,
    pub members: String,
    pub published_at: PublishedAt,
    pub thumbnail: String,
    #[serde(default)]
    pub description: String,
    pub file: ApiFile,
}

#[serde_with::serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ApiFile {
    pub url: String,
    // some exports carry the duration as a string
    #[serde_as(as = "serde_with::PickFirst<(_, serde_with::DisplayFromStr)>")]
    pub duration: u64,
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn list_episodes(&self, query: &ListQuery) -> Result<Vec<ApiEpisode>, ApiError> {
        let endpoint = self.endpoint("episodes");
        debug!("listing episodes from {endpoint}: {query:?}");

        let request = self.client.get(&endpoint).query(query);
        self.send(endpoint, request).await
    }

    /// `id` must already be a validated slug.
    pub async fn episode(&self, id: &str) -> Result<ApiEpisode, ApiError> {
        let endpoint = self.endpoint(&format!("episodes/{id}"));
        debug!("fetching episode from {endpoint}");

        let request = self.client.get(&endpoint);
        self.send(endpoint, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: String,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(source) => return Err(ApiError::Http { endpoint, source }),
        };

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound { endpoint });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("{endpoint}: HTTP {status}");
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        match resp.json::<T>().await {
            Ok(t) => Ok(t),
            Err(source) => Err(ApiError::Decode { endpoint, source }),
        }
    }
}
