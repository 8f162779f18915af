use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::models::ApiError;
use crate::api::TransactionsApi;
use crate::models::{NewTransaction, TransactionRecord};

/// How many times a failed request is repeated, and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retries: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_RETRIES: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

    /// Total number of attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: Self::DEFAULT_RETRIES,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

/// Ledger API client for the transactions endpoint
pub struct LedgerClient {
    http_client: HttpClient,
    base_url: String,
    retry: RetryPolicy,
}

impl LedgerClient {
    const TRANSACTIONS_PATH: &'static str = "/api/transactions";

    /// Create a new client with a custom retry policy
    pub fn with_retry(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into(),
            retry,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn create_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Run a single attempt and decode the JSON body
    async fn send_once<B, T>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&B>,
        attempt: u32,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self
            .http_client
            .request(method.clone(), url)
            .headers(Self::create_headers());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(
                url = %url,
                method = %method,
                attempt,
                max_attempts = self.retry.max_attempts(),
                "API request could not be sent: {}",
                e
            );
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = ApiError::from_status(status);
            error!(
                url = %url,
                method = %method,
                status = status.as_u16(),
                status_text = status.canonical_reason().unwrap_or(""),
                attempt,
                max_attempts = self.retry.max_attempts(),
                "API request failed"
            );
            return Err(err);
        }

        response.json::<T>().await.map_err(ApiError::from)
    }

    /// Send a request, retrying on any failure until the policy is exhausted
    async fn request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            match self.send_once::<B, T>(&method, &url, body, attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts => {
                    debug!(
                        "Retrying {} {} in {}ms (attempt {}/{}): {}",
                        method,
                        url,
                        self.retry.delay.as_millis(),
                        attempt,
                        max_attempts,
                        e
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        url = %url,
                        method = %method,
                        error = %e,
                        status = ?e.status(),
                        attempts = attempt,
                        max_attempts,
                        "API request failed after all retries"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl TransactionsApi for LedgerClient {
    /// GET /api/transactions
    ///
    /// Returns every transaction; paging is done client-side.
    async fn get_transactions(&self) -> Result<Vec<TransactionRecord>, ApiError> {
        self.request_json::<(), Vec<TransactionRecord>>(Method::GET, Self::TRANSACTIONS_PATH, None)
            .await
    }

    /// POST /api/transactions
    ///
    /// Returns the stored record with its server-assigned id.
    async fn add_transaction(&self, payload: &NewTransaction) -> Result<TransactionRecord, ApiError> {
        self.request_json(Method::POST, Self::TRANSACTIONS_PATH, Some(payload))
            .await
    }
}
