//! Usage: Bearer-authenticated API client with a rate-limit-aware request loop.

use crate::oauth::authorize::API_BASE_URL;
use crate::oauth::login::http_client;
use crate::shared::error::{AppError, AppResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// One authenticated session: the access token and its derived header set,
/// held in memory for the process lifetime.
pub struct SpotifyClient {
    http: reqwest::Client,
    headers: HeaderMap,
    api_base_url: String,
    max_rate_limit_retries: Option<u32>,
}

impl SpotifyClient {
    pub fn new(access_token: &str) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|e| format!("SYSTEM_ERROR: access token is not a valid header value: {e}"))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            http: http_client()?,
            headers,
            api_base_url: API_BASE_URL.to_string(),
            max_rate_limit_retries: None,
        })
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// Bounds consecutive 429 retries. `None` (the default) retries
    /// indefinitely, as the provider's rate limiting is always transient.
    pub fn with_max_rate_limit_retries(mut self, max: Option<u32>) -> Self {
        self.max_rate_limit_retries = max;
        self
    }

    /// Issues one request with the session headers merged in. On 429 the
    /// `Retry-After` header is re-read fresh each time (servers vary it),
    /// the loop sleeps that many seconds plus one, and the same request is
    /// retried. A loop, not recursion: an unbounded 429 run must not grow
    /// the stack.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> AppResult<reqwest::Response> {
        let mut attempts: u32 = 0;
        loop {
            let mut builder = self
                .http
                .request(method.clone(), url)
                .headers(self.headers.clone());
            if let Some(body) = body {
                builder = builder.json(body);
            }
            let response = builder
                .send()
                .await
                .map_err(|e| format!("SYSTEM_ERROR: request to {url} failed: {e}"))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if let Some(max) = self.max_rate_limit_retries {
                if attempts >= max {
                    return Err(format!(
                        "RATE_LIMITED: still rate limited after {max} retries"
                    )
                    .into());
                }
            }
            attempts += 1;

            let wait_secs = retry_after_seconds(response.headers()) + 1;
            tracing::warn!(wait_secs, "rate limited by the API, waiting before retry");
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }
    }

    /// Fetches the authenticated user's id from the current-profile endpoint.
    pub async fn get_user_id(&self) -> AppResult<String> {
        let url = format!("{}/me", self.api_base_url);
        let response = self.request(Method::GET, &url, None).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "PROFILE_ERROR: profile fetch returned status={}",
                status.as_u16()
            )
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("SYSTEM_ERROR: profile response read failed: {e}"))?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| format!("PROFILE_ERROR: profile response json invalid: {e}"))?;
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::from("PROFILE_ERROR: profile response missing id"))?;

        Ok(id.to_string())
    }
}

fn retry_after_seconds(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
