use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::common::types::{ApiResponse, VerifyRequest};

pub const VERIFY_PATH: &str = "/api/messages/verify";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    /// The verifier could not be reached or did not answer in time.
    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode verifier response: {0}")]
    Decode(String),
}

/// HTTP client for a remote verifier.
#[derive(Clone, Debug)]
pub struct VerifierClient {
    base_url: String,
    http: reqwest::Client,
}

impl VerifierClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            base_url: normalize_base_url(base_url),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn verify_url(&self) -> String {
        format!("{}{}", self.base_url, VERIFY_PATH)
    }

    /// Submits `(message, signature)` and returns the verifier's envelope.
    ///
    /// Any status with a JSON envelope body is returned as-is; other error
    /// bodies are wrapped as `Server error, <status>`.
    pub async fn verify(&self, message: &str, signature: &str) -> Result<ApiResponse, ClientError> {
        let request = VerifyRequest {
            message: message.to_string(),
            signature: signature.to_string(),
        };

        let response = self
            .http
            .post(self.verify_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        debug!(%status, body = %text, "Verifier responded");

        match serde_json::from_str::<ApiResponse>(&text) {
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => Err(ClientError::Decode(e.to_string())),
            Err(_) => Ok(server_error(status, &text)),
        }
    }
}

fn server_error(status: StatusCode, body: &str) -> ApiResponse {
    let details = match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .get("error")
            .and_then(Value::as_str)
            .map(|s| json!(s))
            .unwrap_or(value),
        Err(_) if body.is_empty() => json!("Unknown server error"),
        Err(_) => json!(body),
    };
    ApiResponse::error(format!("Server error, {}", status.as_u16()), Some(details))
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
