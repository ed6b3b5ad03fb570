use super::error::AddressError;
use super::verify::keccak256;

/// EIP-55 mixed-case encoding of a raw address, `0x` prefixed.
///
/// Accepts any byte slice so callers holding unvalidated data get a typed
/// error instead of a panic.
pub fn checksum(raw_address: &[u8]) -> Result<String, AddressError> {
    if raw_address.len() != 20 {
        return Err(AddressError::InvalidLength(raw_address.len()));
    }

    let lower = hex::encode(raw_address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}
