use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures produced while decoding or recovering a personal_sign signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature string is not `0x` followed by 130 hex digits.
    #[error("invalid signature format: {0}")]
    InvalidFormat(String),

    /// `v` is not one of 0, 1, 27 or 28.
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// `s` lies in the upper half of the curve order (EIP-2).
    #[error("malleable signature (high s value)")]
    MalleableSignature,

    /// The curve arithmetic rejected the signature.
    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// Failure categories carried by a failed [`VerificationResult`](super::types::VerificationResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    InvalidSignatureFormat,
    InvalidSignature,
    InvalidAddress,
    Internal,
}

impl ErrorKind {
    /// Short label suitable for direct display.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation failed",
            ErrorKind::InvalidSignatureFormat => "Invalid signature format",
            ErrorKind::InvalidSignature => "Invalid signature",
            ErrorKind::InvalidAddress => "Invalid recovered address",
            ErrorKind::Internal => "Internal server error",
        }
    }

    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Internal => 500,
            _ => 400,
        }
    }
}

impl From<&SignatureError> for ErrorKind {
    fn from(err: &SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat(_) => ErrorKind::InvalidSignatureFormat,
            _ => ErrorKind::InvalidSignature,
        }
    }
}
