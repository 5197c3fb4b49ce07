//! Raw RSA key components exchanged with backends.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Private and CRT components, in container order.
///
/// Values are unsigned big-endian magnitudes; leading zero bytes are allowed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKeyFields {
    /// d
    pub private_exponent: Vec<u8>,
    /// p
    pub prime1: Vec<u8>,
    /// q
    pub prime2: Vec<u8>,
    /// d mod (p - 1)
    pub exponent1: Vec<u8>,
    /// d mod (q - 1)
    pub exponent2: Vec<u8>,
    /// q^-1 mod p
    pub coefficient: Vec<u8>,
}

impl PrivateKeyFields {
    pub(crate) fn as_array(&self) -> [&[u8]; 6] {
        [
            &self.private_exponent,
            &self.prime1,
            &self.prime2,
            &self.exponent1,
            &self.exponent2,
            &self.coefficient,
        ]
    }
}

impl fmt::Debug for PrivateKeyFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKeyFields([REDACTED])")
    }
}

/// The components of one RSA key as seen by a backend.
///
/// Staging copies of private material live in this type, which wipes itself
/// on drop, including when an import fails halfway.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RsaKeyFields {
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
    pub private: Option<PrivateKeyFields>,
}

impl RsaKeyFields {
    pub fn public(modulus: Vec<u8>, public_exponent: Vec<u8>) -> Self {
        Self {
            modulus,
            public_exponent,
            private: None,
        }
    }

    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// A copy holding only the public components.
    pub fn to_public(&self) -> Self {
        Self::public(self.modulus.clone(), self.public_exponent.clone())
    }

    /// Same components with leading zero bytes stripped from every value.
    pub fn normalized(&self) -> Self {
        let strip = |v: &[u8]| strip_leading_zeros(v).to_vec();
        Self {
            modulus: strip(&self.modulus),
            public_exponent: strip(&self.public_exponent),
            private: self.private.as_ref().map(|p| PrivateKeyFields {
                private_exponent: strip(&p.private_exponent),
                prime1: strip(&p.prime1),
                prime2: strip(&p.prime2),
                exponent1: strip(&p.exponent1),
                exponent2: strip(&p.exponent2),
                coefficient: strip(&p.coefficient),
            }),
        }
    }
}

impl fmt::Debug for RsaKeyFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyFields")
            .field("modulus_len", &self.modulus.len())
            .field("public_exponent", &self.public_exponent)
            .field("private", &self.private)
            .finish()
    }
}

pub(crate) fn strip_leading_zeros(value: &[u8]) -> &[u8] {
    let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    &value[start..]
}
