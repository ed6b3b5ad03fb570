use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

use super::checksum::checksum;
use super::codec::RawSignature;
use super::error::{ErrorKind, SignatureError};
use super::normalize::normalize;
use super::types::{MessageData, VerificationResult, VerifyRequest};
use super::verify;

pub const MIN_MESSAGE_CHARS: usize = 1;
pub const MAX_MESSAGE_CHARS: usize = 10_000;

/// Stateless verification pipeline: validate, normalize, recover, checksum.
///
/// Holds no mutable state, so one instance can serve any number of
/// concurrent requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationService;

struct FieldIssue {
    field: &'static str,
    message: &'static str,
}

impl VerificationService {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(&self, request: &VerifyRequest) -> VerificationResult {
        self.verify_at(request, Utc::now())
    }

    /// Same as [`verify`](Self::verify) with an explicit timestamp.
    pub fn verify_at(&self, request: &VerifyRequest, now: DateTime<Utc>) -> VerificationResult {
        let normalized = normalize(&request.message);

        let signature = match validate(&normalized, &request.signature) {
            Ok(signature) => signature,
            Err((kind, detail)) => {
                warn!(?kind, %detail, "Rejected verify request");
                return VerificationResult::failure(kind, detail);
            }
        };

        let raw_address = match verify::recover(&normalized, &signature) {
            Ok(address) => address,
            Err(e) => {
                warn!(error = %e, "Signature recovery failed");
                return VerificationResult::failure(ErrorKind::from(&e), e.to_string());
            }
        };

        let recovered_address = match checksum(&raw_address) {
            Ok(address) => address,
            Err(e) => {
                warn!(error = %e, "Recovered address failed checksum");
                return VerificationResult::failure(ErrorKind::InvalidAddress, e.to_string());
            }
        };

        info!("Verified message for {}", recovered_address);

        VerificationResult::Success(MessageData {
            message: normalized,
            signature: request.signature.clone(),
            recovered_address,
            verified: true,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

/// Checks request shape before any curve arithmetic runs.
fn validate(normalized: &str, signature: &str) -> Result<RawSignature, (ErrorKind, String)> {
    let mut issues = Vec::new();

    let chars = normalized.chars().count();
    if chars < MIN_MESSAGE_CHARS {
        issues.push(FieldIssue {
            field: "message",
            message: "Message cannot be empty",
        });
    } else if chars > MAX_MESSAGE_CHARS {
        issues.push(FieldIssue {
            field: "message",
            message: "Message too long",
        });
    }

    let decoded = RawSignature::from_hex(signature);
    if decoded.is_err() {
        issues.push(FieldIssue {
            field: "signature",
            message: "Invalid signature format",
        });
    }

    match (issues.is_empty(), decoded) {
        (true, Ok(signature)) => Ok(signature),
        (_, decoded) => {
            let message_invalid = issues.iter().any(|issue| issue.field == "message");
            let detail = match decoded {
                Err(SignatureError::InvalidFormat(reason)) if !message_invalid => reason,
                _ => issues
                    .iter()
                    .map(|issue| format!("{}: {}", issue.field, issue.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            };
            let kind = if message_invalid {
                ErrorKind::Validation
            } else {
                ErrorKind::InvalidSignatureFormat
            };
            Err((kind, detail))
        }
    }
}
