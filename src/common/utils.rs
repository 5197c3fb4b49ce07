use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::common::errors::Result;

/// Compares two byte sequences without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0;
    for (byte_a, byte_b) in a.iter().zip(b.iter()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

/// Byte vector that is wiped when dropped. Used for anything that may hold
/// private key material.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingVec(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl ZeroizingVec {
    pub fn with_len(len: usize) -> Self {
        Self(vec![0u8; len])
    }
}

impl Deref for ZeroizingVec {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for ZeroizingVec {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for ZeroizingVec {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for ZeroizingVec {}

impl std::fmt::Debug for ZeroizingVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ZeroizingVec([REDACTED; {}])", self.0.len())
    }
}

pub fn to_base64(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub fn from_base64(encoded: &str) -> Result<Vec<u8>> {
    Ok(general_purpose::STANDARD.decode(encoded)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        let a = b"sensitive data";
        let b = b"sensitive data";
        let c = b"different data";

        assert!(constant_time_eq(a, b));
        assert!(!constant_time_eq(a, c));
        assert!(!constant_time_eq(a, &c[0..5]));
    }

    #[test]
    fn test_zeroizing_vec_debug_is_redacted() {
        let secret = ZeroizingVec(b"top secret".to_vec());
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("top secret"));
        assert!(rendered.contains("10"));
    }

    #[test]
    fn test_zeroizing_vec_zeroize() {
        let mut secret = ZeroizingVec(vec![0xAA; 16]);
        secret.zeroize();
        assert!(secret.is_empty());
    }

    #[test]
    fn test_base64_roundtrip() {
        let original = b"Hello, key container!";
        let encoded = to_base64(original);
        assert_eq!(from_base64(&encoded).unwrap(), original);
        assert!(from_base64("not base64!").is_err());
    }
}
