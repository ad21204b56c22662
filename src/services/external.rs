//! Author and category directories living in other services.
//!
//! The catalog only needs to know whether an id exists there. A `GET
//! {base}/{id}` answering 2xx means yes, 404 means no; any other status or a
//! transport failure is reported as [`AppError::External`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use uuid::Uuid;

use crate::{
    config::ExternalConfig,
    error::{AppError, AppResult},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExternalLookup: Send + Sync {
    async fn author_exists(&self, author_id: Uuid) -> AppResult<bool>;
    async fn category_exists(&self, category_id: Uuid) -> AppResult<bool>;
}

/// Reqwest-backed lookup against the configured directory endpoints
pub struct HttpLookup {
    client: Client,
    authors_url: String,
    categories_url: String,
}

impl HttpLookup {
    pub fn new(config: &ExternalConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            authors_url: config.authors_url.trim_end_matches('/').to_string(),
            categories_url: config.categories_url.trim_end_matches('/').to_string(),
        })
    }

    async fn exists(&self, base: &str, id: Uuid, what: &'static str) -> AppResult<bool> {
        let url = format!("{}/{}", base, id);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%id, "{what} lookup failed: {e}");
                AppError::External(format!("{what} service unreachable"))
            })?;

        classify(response.status(), what)
    }
}

fn classify(status: StatusCode, what: &'static str) -> AppResult<bool> {
    if status.is_success() {
        Ok(true)
    } else if status == StatusCode::NOT_FOUND {
        Ok(false)
    } else {
        tracing::error!(%status, "{what} lookup returned an unexpected status");
        Err(AppError::External(format!("{what} service answered {status}")))
    }
}

#[async_trait]
impl ExternalLookup for HttpLookup {
    async fn author_exists(&self, author_id: Uuid) -> AppResult<bool> {
        self.exists(&self.authors_url, author_id, "author").await
    }

    async fn category_exists(&self, category_id: Uuid) -> AppResult<bool> {
        self.exists(&self.categories_url, category_id, "category").await
    }
}
