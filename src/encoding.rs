//! Base-62 short code derivation
//!
//! Short codes are the positional base-62 representation of the identity the
//! durable store assigned to a mapping. The alphabet is digits, then lowercase,
//! then uppercase.

/// Digit set for the positional encoding
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Encode an identity as a base-62 short code
///
/// `encode(0)` is `"0"` rather than the empty string.
pub fn encode(id: u64) -> String {
    base62::encode_alternative(u128::from(id))
}

/// Decode a short code back into the identity it was derived from
///
/// Returns `None` for an empty string, a character outside the alphabet, or a
/// value that does not fit in `u64`.
pub fn decode(code: &str) -> Option<u64> {
    if code.is_empty() {
        return None;
    }

    base62::decode_alternative(code)
        .ok()
        .and_then(|value| u64::try_from(value).ok())
}
