use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::retry::{
    is_retryable_http_error, new_request_id, parse_retry_after_ms, should_retry_status,
    truncate_for_error, RetryPolicy,
};
use crate::ServiceError;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const MAX_ERROR_BODY_CHARS: usize = 800;

/// Shared request loop for the service clients: default headers, timeout,
/// retry policy and status-to-error mapping.
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    service: &'static str,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub(crate) fn new(
        service: &'static str,
        mut headers: HeaderMap,
        request_timeout_ms: u64,
        retry: RetryPolicy,
    ) -> Result<Self, ServiceError> {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("launch-provisioner"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .map_err(|error| ServiceError::Setup {
                service,
                message: error.to_string(),
            })?;
        Ok(Self {
            service,
            client,
            retry,
        })
    }

    pub(crate) fn header_value(
        service: &'static str,
        value: &str,
    ) -> Result<HeaderValue, ServiceError> {
        HeaderValue::from_str(value.trim()).map_err(|error| ServiceError::Setup {
            service,
            message: format!("invalid header value: {error}"),
        })
    }

    /// Sends until success or the retry policy gives up. Non-success statuses
    /// become [`ServiceError::Status`] with a truncated body.
    pub(crate) async fn send<F>(
        &self,
        operation: &'static str,
        mut request_builder: F,
    ) -> Result<reqwest::Response, ServiceError>
    where
        F: FnMut(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let started = Instant::now();
        let mut attempt = 0_usize;
        loop {
            let request = request_builder(&self.client)
                .header("x-launch-request-id", new_request_id())
                .header("x-launch-retry-attempt", attempt.to_string())
                .build()
                .map_err(|error| ServiceError::Transport {
                    service: self.service,
                    operation,
                    source: error,
                })?;
            let idempotent = request.method().is_idempotent();
            let response = self.client.execute(request).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let retry_after_ms = parse_retry_after_ms(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if should_retry_status(status.as_u16(), idempotent) {
                        if let Some(delay_ms) =
                            self.retry.next_delay_ms(attempt, elapsed_ms, retry_after_ms)
                        {
                            tracing::debug!(
                                service = self.service,
                                operation,
                                status = status.as_u16(),
                                attempt,
                                delay_ms,
                                "retrying service request"
                            );
                            sleep(Duration::from_millis(delay_ms)).await;
                            attempt = attempt.saturating_add(1);
                            continue;
                        }
                    }
                    return Err(ServiceError::Status {
                        service: self.service,
                        operation,
                        status: status.as_u16(),
                        body: truncate_for_error(&body, MAX_ERROR_BODY_CHARS),
                    });
                }
                Err(error) => {
                    if is_retryable_http_error(&error, idempotent) {
                        if let Some(delay_ms) = self.retry.next_delay_ms(attempt, elapsed_ms, None)
                        {
                            sleep(Duration::from_millis(delay_ms)).await;
                            attempt = attempt.saturating_add(1);
                            continue;
                        }
                    }
                    return Err(ServiceError::Transport {
                        service: self.service,
                        operation,
                        source: error,
                    });
                }
            }
        }
    }

    pub(crate) async fn json<T, F>(
        &self,
        operation: &'static str,
        request_builder: F,
    ) -> Result<T, ServiceError>
    where
        T: DeserializeOwned,
        F: FnMut(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let response = self.send(operation, request_builder).await?;
        let raw = response
            .text()
            .await
            .map_err(|error| ServiceError::Transport {
                service: self.service,
                operation,
                source: error,
            })?;
        serde_json::from_str::<T>(&raw).map_err(|error| ServiceError::InvalidResponse {
            service: self.service,
            operation,
            message: format!("{error}: {}", truncate_for_error(&raw, 200)),
        })
    }

    /// Like [`HttpTransport::json`], mapping 404 to `Ok(None)`.
    pub(crate) async fn optional_json<T, F>(
        &self,
        operation: &'static str,
        request_builder: F,
    ) -> Result<Option<T>, ServiceError>
    where
        T: DeserializeOwned,
        F: FnMut(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        match self.json(operation, request_builder).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.status() == Some(404) => Ok(None),
            Err(error) => Err(error),
        }
    }
}

pub(crate) fn trim_api_base(api_base: &str) -> String {
    api_base.trim().trim_end_matches('/').to_string()
}
