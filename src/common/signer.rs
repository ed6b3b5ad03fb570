use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use std::env;
use std::fs;
use thiserror::Error;

use super::checksum::checksum;
use super::codec::RawSignature;
use super::verify::{address_of, personal_message_hash};

pub const PRIVATE_KEY_ENV: &str = "SIGNER_PRIVATE_KEY";
pub const PRIVATE_KEY_FILE: &str = "private_key.hex";

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("failed to read private key: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Anything that can turn a message into a personal_sign signature.
///
/// Wallet connectors, remote signers and local keys all sit behind this one
/// operation.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Signs `message` and returns `0x` + 130 hex digits.
    async fn sign_message(&self, message: &str) -> Result<String, SignerError>;

    /// Checksummed address of the signing account, if known.
    fn address_hint(&self) -> Option<String> {
        None
    }
}

/// Signs with an in-process secp256k1 key.
#[derive(Clone)]
pub struct LocalKeySigner {
    key: SigningKey,
}

impl std::fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("address", &self.checksummed_address())
            .finish()
    }
}

impl LocalKeySigner {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Parses a 32-byte key given as hex, with or without `0x`.
    pub fn from_hex(key_hex: &str) -> Result<Self, SignerError> {
        let key_hex = key_hex.trim();
        let digits = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let bytes = hex::decode(digits).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        let key =
            SigningKey::from_slice(&bytes).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        Ok(Self::new(key))
    }

    /// Loads the key from the environment, falling back to `private_key.hex`.
    pub fn load() -> Result<Self, SignerError> {
        let key_hex = match env::var(PRIVATE_KEY_ENV) {
            Ok(key) => key,
            Err(_) => fs::read_to_string(PRIVATE_KEY_FILE)?,
        };
        Self::from_hex(&key_hex)
    }

    pub fn key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.key.to_bytes()))
    }

    pub fn address(&self) -> [u8; 20] {
        address_of(self.key.verifying_key())
    }

    pub fn checksummed_address(&self) -> String {
        // address_of always yields 20 bytes
        checksum(&self.address()).unwrap_or_default()
    }

    /// personal_sign over `message` as given, with `v` encoded as 27/28.
    pub fn sign_personal(&self, message: &str) -> Result<String, SignerError> {
        let digest = personal_message_hash(message);
        let (sig, recovery_id) = self
            .key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| SignerError::Signing(e.to_string()))?;

        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RawSignature {
            r,
            s,
            v: 27 + recovery_id.to_byte(),
        }
        .to_hex())
    }
}

#[async_trait]
impl MessageSigner for LocalKeySigner {
    async fn sign_message(&self, message: &str) -> Result<String, SignerError> {
        self.sign_personal(message)
    }

    fn address_hint(&self) -> Option<String> {
        Some(self.checksummed_address())
    }
}
