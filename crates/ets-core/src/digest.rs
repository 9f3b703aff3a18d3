//! # 256-bit Digests
//!
//! `Digest256` is the single representation of a SHA-256 output in the
//! stack: credential hashes, authorized-secret hashes, Merkle nodes, and
//! disclosure-policy hashes.
//!
//! ## Encoding
//!
//! Digests serialize as 64 lowercase hex characters. Parsing accepts an
//! optional `0x` prefix and either case, which matches the bytes32 form used
//! by ledger clients. As an integer (for Schnorr exponents) a digest is read
//! big-endian.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// A SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest256([u8; 32]);

impl Digest256 {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-char hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if body.len() != 64 {
            return Err(CryptoError::DigestError(format!(
                "expected 64 hex chars, got {}",
                body.len()
            )));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(body, &mut out)
            .map_err(|e| CryptoError::DigestError(format!("invalid hex: {e}")))?;
        Ok(Self(out))
    }

    /// The raw 32 digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Interpret the digest as a big-endian unsigned integer.
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }
}

impl fmt::Display for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest256({})", self.to_hex())
    }
}

impl FromStr for Digest256 {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Digest256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 of raw bytes.
pub fn sha256_bytes(data: &[u8]) -> Digest256 {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    Digest256(bytes)
}

/// SHA-256 of a protocol string hashed as UTF-8 text.
///
/// Used for secrets, subject identifiers, Merkle node concatenations and
/// rendered disclosure lists.
pub fn sha256_str(data: &str) -> Digest256 {
    sha256_bytes(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sha256_vector() {
        assert_eq!(
            sha256_str("abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hex_parse_accepts_prefix_and_uppercase() {
        let d = sha256_str("123456789");
        let prefixed = format!("0x{}", d.to_hex().to_uppercase());
        assert_eq!(Digest256::from_hex(&prefixed).unwrap(), d);
    }

    #[test]
    fn hex_parse_rejects_bad_length() {
        assert!(Digest256::from_hex("aabb").is_err());
        assert!(Digest256::from_hex(&"0".repeat(66)).is_err());
    }

    #[test]
    fn hex_parse_rejects_non_hex() {
        assert!(Digest256::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn serde_as_hex_string() {
        let d = sha256_str("did:university:student1");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
        let back: Digest256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn biguint_is_big_endian() {
        let mut bytes = [0u8; 32];
        bytes[31] = 0x01;
        bytes[30] = 0x02;
        assert_eq!(Digest256::from_bytes(bytes).to_biguint(), BigUint::from(0x0201u32));
    }
}
