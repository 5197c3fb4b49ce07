//! RSA key size policy.
//!
//! Only a fixed set of modulus sizes is accepted. Every size that reaches a
//! backend, whether requested for generation or read from a container, has
//! been checked here first.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::errors::{Error, Result};

/// Key size used when nothing else is configured.
pub const DEFAULT_KEY_BITS: u32 = 2048;

/// Public exponent produced by key generation on every backend (F4).
pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65537;

/// Supported RSA modulus sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum KeySize {
    Rsa1024,
    Rsa2048,
    Rsa3072,
    Rsa4096,
}

impl KeySize {
    pub const ALL: [KeySize; 4] = [
        KeySize::Rsa1024,
        KeySize::Rsa2048,
        KeySize::Rsa3072,
        KeySize::Rsa4096,
    ];

    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            1024 => Ok(KeySize::Rsa1024),
            2048 => Ok(KeySize::Rsa2048),
            3072 => Ok(KeySize::Rsa3072),
            4096 => Ok(KeySize::Rsa4096),
            other => Err(Error::UnsupportedKeySize(other)),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            KeySize::Rsa1024 => 1024,
            KeySize::Rsa2048 => 2048,
            KeySize::Rsa3072 => 3072,
            KeySize::Rsa4096 => 4096,
        }
    }

    pub fn modulus_length(self) -> ModulusLength {
        ModulusLength(self)
    }
}

impl Default for KeySize {
    fn default() -> Self {
        KeySize::Rsa2048
    }
}

impl TryFrom<u32> for KeySize {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        KeySize::from_bits(bits)
    }
}

impl From<KeySize> for u32 {
    fn from(size: KeySize) -> u32 {
        size.bits()
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RSA-{}", self.bits())
    }
}

/// Validated modulus length.
///
/// Can only be obtained through the policy, so holding one proves the size is
/// supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModulusLength(KeySize);

impl ModulusLength {
    /// Modulus length in bytes.
    pub fn bytes(self) -> usize {
        self.0.bits() as usize / 8
    }

    pub fn bits(self) -> u32 {
        self.0.bits()
    }

    /// Width of each prime-sized private field (p, q and the CRT values).
    pub fn half_bytes(self) -> usize {
        self.bytes() / 2
    }

    pub fn key_size(self) -> KeySize {
        self.0
    }

    /// Maps an encoded modulus byte length back onto the policy.
    pub fn from_bytes(len: usize) -> Option<Self> {
        KeySize::ALL
            .into_iter()
            .map(KeySize::modulus_length)
            .find(|m| m.bytes() == len)
    }
}

/// Checks a requested bit count against the supported set.
pub fn validate_and_normalize(requested_bits: u32) -> Result<ModulusLength> {
    KeySize::from_bits(requested_bits).map(KeySize::modulus_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_sizes() {
        for (bits, bytes) in [(1024, 128), (2048, 256), (3072, 384), (4096, 512)] {
            let modulus = validate_and_normalize(bits).unwrap();
            assert_eq!(modulus.bytes(), bytes);
            assert_eq!(modulus.bits(), bits);
            assert_eq!(modulus.half_bytes(), bytes / 2);
            assert_eq!(ModulusLength::from_bytes(bytes), Some(modulus));
        }
    }

    #[test]
    fn test_unsupported_sizes() {
        for bits in [0, 1, 512, 513, 1023, 2047, 3000, 8192, u32::MAX] {
            assert!(matches!(
                validate_and_normalize(bits),
                Err(Error::UnsupportedKeySize(b)) if b == bits
            ));
        }
        assert_eq!(ModulusLength::from_bytes(129), None);
        assert_eq!(ModulusLength::from_bytes(0), None);
    }

    #[test]
    fn test_key_size_serde() {
        let json = serde_json::to_string(&KeySize::Rsa3072).unwrap();
        assert_eq!(json, "3072");
        assert_eq!(serde_json::from_str::<KeySize>("4096").unwrap(), KeySize::Rsa4096);
        assert!(serde_json::from_str::<KeySize>("3000").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(KeySize::Rsa2048.to_string(), "RSA-2048");
        assert_eq!(KeySize::default(), KeySize::Rsa2048);
    }
}
