use super::error::SignatureError;

/// Length of an encoded signature: `0x` plus 65 bytes of hex.
pub const SIGNATURE_HEX_LEN: usize = 2 + 65 * 2;

/// A decoded 65-byte personal_sign signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl RawSignature {
    /// Parses `0x` followed by exactly 130 hex digits (either case).
    pub fn from_hex(sig: &str) -> Result<Self, SignatureError> {
        let digits = sig
            .strip_prefix("0x")
            .ok_or_else(|| SignatureError::InvalidFormat("missing 0x prefix".to_string()))?;

        if digits.len() != SIGNATURE_HEX_LEN - 2 {
            return Err(SignatureError::InvalidFormat(format!(
                "expected 130 hex characters, got {}",
                digits.len()
            )));
        }

        let mut bytes = [0u8; 65];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| SignatureError::InvalidFormat(e.to_string()))?;

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);

        Ok(Self { r, s, v: bytes[64] })
    }

    /// Encodes back to the lower-case wire form.
    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(65);
        bytes.extend_from_slice(&self.r);
        bytes.extend_from_slice(&self.s);
        bytes.push(self.v);
        format!("0x{}", hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_hex() -> String {
        format!("0x{}{}1b", "ab".repeat(32), "cd".repeat(32))
    }

    #[test]
    fn test_decode_splits_components() {
        let sig = RawSignature::from_hex(&sample_hex()).unwrap();
        assert_eq!(sig.r, [0xab; 32]);
        assert_eq!(sig.s, [0xcd; 32]);
        assert_eq!(sig.v, 27);
        assert_eq!(sig.to_hex(), sample_hex());
    }

    #[test]
    fn test_decode_accepts_upper_case() {
        let sig = RawSignature::from_hex(&sample_hex().to_uppercase().replacen("0X", "0x", 1));
        assert!(sig.is_ok());
    }

    #[test]
    fn test_missing_prefix_rejected() {
        let no_prefix = sample_hex()[2..].to_string();
        assert_matches!(
            RawSignature::from_hex(&no_prefix),
            Err(SignatureError::InvalidFormat(_))
        );
        assert_matches!(
            RawSignature::from_hex(&format!("0X{}", no_prefix)),
            Err(SignatureError::InvalidFormat(_))
        );
    }

    #[test]
    fn test_wrong_lengths_rejected() {
        for len in [0, 128, 129, 131, 132] {
            let sig = format!("0x{}", "a".repeat(len));
            assert_matches!(
                RawSignature::from_hex(&sig),
                Err(SignatureError::InvalidFormat(_)),
                "length {} accepted",
                len
            );
        }
    }

    #[test]
    fn test_non_hex_rejected() {
        let sig = format!("0x{}zz", "ab".repeat(64));
        assert_matches!(
            RawSignature::from_hex(&sig),
            Err(SignatureError::InvalidFormat(_))
        );
    }

    #[test]
    fn test_multibyte_input_rejected_without_panic() {
        // 130 bytes but fewer characters
        let sig = format!("0x{}é", "a".repeat(128));
        assert!(RawSignature::from_hex(&sig).is_err());
    }
}
