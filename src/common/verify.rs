use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

use super::codec::RawSignature;
use super::error::SignatureError;

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Half of the secp256k1 group order, n/2. Signatures with `s` above this are
/// rejected (EIP-2).
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Builds the personal_sign payload: prefix, decimal byte length, message bytes.
pub fn personal_message_payload(message: &str) -> Vec<u8> {
    let len = message.len().to_string();
    let mut payload =
        Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + len.len() + message.len());
    payload.extend_from_slice(PERSONAL_MESSAGE_PREFIX.as_bytes());
    payload.extend_from_slice(len.as_bytes());
    payload.extend_from_slice(message.as_bytes());
    payload
}

/// Keccak-256 digest of the personal_sign payload.
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    keccak256(&personal_message_payload(message))
}

/// Maps the accepted `v` encodings (0/1 and 27/28) onto a recovery id.
pub fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        other => return Err(SignatureError::InvalidRecoveryId(other)),
    };
    RecoveryId::from_byte(id).ok_or(SignatureError::InvalidRecoveryId(v))
}

fn is_low_s(s: &[u8; 32]) -> bool {
    // big-endian byte arrays compare lexicographically as integers
    s.as_slice() <= SECP256K1_HALF_ORDER.as_slice()
}

/// Address of an uncompressed public key: low 20 bytes of Keccak-256 over
/// the 64 coordinate bytes.
pub fn address_of(key: &VerifyingKey) -> [u8; 20] {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Recovers the raw signer address of an already normalized message.
pub fn recover(normalized_message: &str, signature: &RawSignature) -> Result<[u8; 20], SignatureError> {
    let recovery_id = parse_recovery_id(signature.v)?;

    if !is_low_s(&signature.s) {
        return Err(SignatureError::MalleableSignature);
    }

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&rs)
        .map_err(|e| SignatureError::RecoveryFailed(format!("invalid r or s scalar: {}", e)))?;

    let digest = personal_message_hash(normalized_message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

    Ok(address_of(&key))
}
