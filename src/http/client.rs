//! Low-level HTTP client: `CustodyHttp`.
//!
//! One method per custody-service endpoint. Returns wire types; the
//! [`CustodySigner`](crate::signer::custody::CustodySigner) turns them into
//! signing outcomes.

use crate::error::HttpError;
use crate::http::retry::{RetryConfig, RetryPolicy};
use crate::signer::custody::{CreateSigningRequest, SigningRequest};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Low-level HTTP client for the custody signing API.
#[derive(Clone)]
pub struct CustodyHttp {
    base_url: String,
    client: Client,
    /// Bearer token. Never logged.
    api_token: String,
}

impl CustodyHttp {
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            api_token: api_token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Signing requests ─────────────────────────────────────────────────

    pub async fn create_signing_request(
        &self,
        request: &CreateSigningRequest,
    ) -> Result<SigningRequest, HttpError> {
        let url = format!("{}/api/v1/signing-requests", self.base_url);
        self.post(&url, request, RetryPolicy::None).await
    }

    pub async fn get_signing_request(&self, id: &str) -> Result<SigningRequest, HttpError> {
        let url = format!(
            "{}/api/v1/signing-requests/{}",
            self.base_url,
            urlencoding::encode(id)
        );
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str, retry: RetryPolicy) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::GET, url, None::<&()>, retry)
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::POST, url, Some(body), retry)
            .await
    }

    async fn request_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&B>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let config = match &retry {
            RetryPolicy::None => {
                return self.do_request(&method, url, body).await;
            }
            RetryPolicy::Idempotent => RetryConfig::idempotent(),
            RetryPolicy::Custom(c) => c.clone(),
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request::<T, B>(&method, url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if !config.is_retryable(&e) || attempt == config.max_retries {
                        return Err(e);
                    }

                    let delay = match &e {
                        HttpError::RateLimited {
                            retry_after_ms: Some(ms),
                        } => Duration::from_millis(*ms),
                        _ => config.delay_for_attempt(attempt),
                    };
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying request to {}",
                        url
                    );
                    futures_timer::Delay::new(delay).await;
                    last_error = Some(e);
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &reqwest::Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, HttpError> {
        let mut req = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.api_token);

        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();

        if status.is_success() {
            let parsed = resp.json::<T>().await?;
            return Ok(parsed);
        }

        let retry_after_ms = retry_after_ms(resp.headers());
        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();

        match status_code {
            401 | 403 => Err(HttpError::Unauthorized),
            404 => Err(HttpError::NotFound(body_text)),
            408 => Err(HttpError::Timeout),
            429 => Err(HttpError::RateLimited { retry_after_ms }),
            400..=499 => Err(HttpError::BadRequest(body_text)),
            _ => Err(HttpError::ServerError {
                status: status_code,
                body: body_text,
            }),
        }
    }
}

/// `Retry-After` in milliseconds. Only the delay-seconds form is understood.
fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_retry_after_seconds() {
        assert_eq!(retry_after_ms(&headers("3")), Some(3000));
        assert_eq!(retry_after_ms(&HeaderMap::new()), None);
    }

    #[test]
    fn test_retry_after_http_date_is_ignored() {
        assert_eq!(retry_after_ms(&headers("Wed, 21 Oct 2015 07:28:00 GMT")), None);
    }

    #[test]
    fn test_huge_retry_after_saturates() {
        let huge = u64::MAX.to_string();
        assert_eq!(retry_after_ms(&headers(&huge)), Some(u64::MAX));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let http = CustodyHttp::new("http://127.0.0.1:9/", "token", Duration::from_secs(1)).unwrap();
        assert_eq!(http.base_url(), "http://127.0.0.1:9");
    }
}
