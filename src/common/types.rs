use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ErrorKind;

/// Request body for the verify endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub message: String,
    pub signature: String,
}

/// Payload of a successful verification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    pub message: String,
    pub signature: String,
    pub recovered_address: String,
    pub verified: bool,
    pub timestamp: String,
}

/// Outcome of a single verification. Exactly one variant is populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationResult {
    Success(MessageData),
    Failure { kind: ErrorKind, detail: String },
}

impl VerificationResult {
    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        VerificationResult::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, VerificationResult::Success(_))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            VerificationResult::Success(_) => 200,
            VerificationResult::Failure { kind, .. } => kind.status_code(),
        }
    }

    pub fn into_response(self) -> ApiResponse {
        match self {
            VerificationResult::Success(data) => ApiResponse::success(data),
            VerificationResult::Failure { kind, detail } => {
                ApiResponse::error(kind.label(), Some(Value::String(detail)))
            }
        }
    }
}

/// JSON envelope shared by every endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<MessageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiResponse {
    pub fn success(data: MessageData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn error(error: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details,
        }
    }

    /// `details` rendered as display text, whatever JSON shape it arrived in.
    pub fn details_text(&self) -> Option<String> {
        self.details.as_ref().map(|d| match d {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Body of `GET /health`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let result = VerificationResult::Success(MessageData {
            message: "hello".to_string(),
            signature: "0xabc".to_string(),
            recovered_address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
            verified: true,
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        });
        assert_eq!(result.status_code(), 200);

        let body = serde_json::to_value(result.into_response()).unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "data": {
                    "message": "hello",
                    "signature": "0xabc",
                    "recoveredAddress": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
                    "verified": true,
                    "timestamp": "2024-01-01T00:00:00.000Z"
                }
            })
        );
    }

    #[test]
    fn test_failure_envelope_shape() {
        let result = VerificationResult::failure(ErrorKind::InvalidSignature, "recovery failed");
        assert_eq!(result.status_code(), 400);

        let body = serde_json::to_value(result.into_response()).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Invalid signature",
                "details": "recovery failed"
            })
        );
    }

    #[test]
    fn test_details_text_flattens_json() {
        let response = ApiResponse::error("Validation failed", Some(json!([{"field": "message"}])));
        assert_eq!(
            response.details_text().unwrap(),
            r#"[{"field":"message"}]"#
        );
    }
}
