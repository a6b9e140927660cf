//! HTTP transport shared by the network backends
//!
//! Posts a JSON body and returns the raw response text. Non-success
//! statuses are mapped onto [`GenError`] so the retry executor can tell
//! transient failures from permanent ones.

use crate::error::{GenError, GenResult};
use crate::logging::{log_debug, log_error};

use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// POST `body` as JSON, with a bearer token when `api_key` is set.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        api_key: Option<&str>,
        body: &B,
    ) -> GenResult<String> {
        let started = Instant::now();
        let mut request = self.client.post(url).json(body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| map_transport_error(url, e))?;

        log_debug!(
            url = %url,
            status = response.status().as_u16(),
            duration_ms = started.elapsed().as_millis(),
            "Backend responded"
        );

        if !response.status().is_success() {
            return Err(handle_error_response(response).await);
        }

        response.text().await.map_err(|e| {
            log_error!(error = %e, "Failed to read response body");
            GenError::response_parsing_error(format!("Failed to read response: {e}"))
        })
    }
}

fn map_transport_error(url: &str, error: reqwest::Error) -> GenError {
    log_error!(
        url = %url,
        error = %error,
        "HTTP request failed"
    );

    if error.is_timeout() {
        return GenError::timeout(0);
    }
    if error.is_builder() {
        return GenError::configuration_error(format!("Invalid request to {url}: {error}"));
    }
    GenError::request_failed(format!("Request failed: {error}"), None, Some(Box::new(error)))
}

/// Map non-success HTTP responses onto the error taxonomy
async fn handle_error_response(response: reqwest::Response) -> GenError {
    let status = response.status();
    let headers = response.headers().clone();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    log_error!(
        status = %status,
        error_text = %error_text,
        "Backend error response"
    );

    match status.as_u16() {
        401 | 403 => GenError::provider_auth_failure(format!("{status}: {error_text}")),
        408 => GenError::timeout(0),
        429 => {
            let retry_after_seconds = headers
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            GenError::rate_limit_exceeded(retry_after_seconds)
        }
        code @ 400..=499 => GenError::malformed_request(code, error_text),
        code => GenError::request_failed(
            format!("Backend error {status}: {error_text}"),
            Some(code),
            None,
        ),
    }
}
