//! Generating RSA key pairs as containers.
//!
//! ```
//! # fn main() -> seal_rsa::Result<()> {
//! use seal_rsa::keygen::gen_rsa_key_pair;
//! use seal_rsa::KeyKind;
//!
//! let pair = gen_rsa_key_pair(1024)?;
//! assert_eq!(pair.private_key().kind(), KeyKind::RsaPrivate);
//! assert_eq!(pair.public_key().kind(), KeyKind::RsaPublic);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::backend::{DefaultBackend, RsaBackend};
use crate::common::errors::{Error, Result};
use crate::keys::container::{HEADER_LEN, KeyContainer, KeyField, KeyKind};
use crate::keys::context::KeyPairContext;

/// Private and public container of the same RSA key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaKeyPair {
    private_key: KeyContainer,
    public_key: KeyContainer,
}

impl RsaKeyPair {
    /// Pairs two containers, checking their kinds and that the public one
    /// carries the modulus and exponent of the private one.
    pub fn join(private_key: KeyContainer, public_key: KeyContainer) -> Result<Self> {
        if private_key.kind() != KeyKind::RsaPrivate {
            return Err(Error::KeyTypeMismatch {
                expected: KeyKind::RsaPrivate,
                found: private_key.kind(),
            });
        }
        if public_key.kind() != KeyKind::RsaPublic {
            return Err(Error::KeyTypeMismatch {
                expected: KeyKind::RsaPublic,
                found: public_key.kind(),
            });
        }

        // Both layouts start with the same modulus and exponent fields.
        let public_fields = &public_key.as_bytes()[HEADER_LEN..];
        let private_prefix = private_key
            .as_bytes()
            .get(HEADER_LEN..HEADER_LEN + public_fields.len());
        if private_prefix != Some(public_fields) {
            return Err(Error::invalid_field(
                KeyField::Modulus,
                "public key does not belong to the private key",
            ));
        }

        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Exports both halves of a context that holds a private key.
    pub fn from_context<B: RsaBackend>(ctx: &mut KeyPairContext<B>) -> Result<Self> {
        let private_key = ctx.export_to_vec(true)?;
        let public_key = ctx.export_to_vec(false)?;
        Self::join(private_key, public_key)
    }

    pub fn split(self) -> (KeyContainer, KeyContainer) {
        (self.private_key, self.public_key)
    }

    pub fn private_key(&self) -> &KeyContainer {
        &self.private_key
    }

    pub fn public_key(&self) -> &KeyContainer {
        &self.public_key
    }
}

/// Generates a key pair with the default backend.
pub fn gen_rsa_key_pair(bits: u32) -> Result<RsaKeyPair> {
    gen_rsa_key_pair_with::<DefaultBackend>(bits)
}

/// Generates a key pair with backend `B`. The backend key is released before
/// returning.
pub fn gen_rsa_key_pair_with<B: RsaBackend>(bits: u32) -> Result<RsaKeyPair> {
    let mut ctx = KeyPairContext::<B>::generate(bits)?;
    let pair = RsaKeyPair::from_context(&mut ctx)?;
    ctx.release()?;
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_pair_is_consistent() {
        let pair = gen_rsa_key_pair(1024).unwrap();
        let (private_key, public_key) = pair.clone().split();
        assert_eq!(RsaKeyPair::join(private_key, public_key).unwrap(), pair);

        let json = serde_json::to_string(&pair).unwrap();
        let restored: RsaKeyPair = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, pair);
    }

    #[test]
    fn test_join_checks_kinds() {
        let pair = gen_rsa_key_pair(1024).unwrap();
        let (private_key, public_key) = pair.split();
        assert!(matches!(
            RsaKeyPair::join(public_key.clone(), public_key.clone()),
            Err(Error::KeyTypeMismatch {
                expected: KeyKind::RsaPrivate,
                ..
            })
        ));
        assert!(matches!(
            RsaKeyPair::join(private_key.clone(), private_key),
            Err(Error::KeyTypeMismatch {
                expected: KeyKind::RsaPublic,
                ..
            })
        ));
    }

    #[test]
    fn test_join_rejects_foreign_public_key() {
        let (private_key, _) = gen_rsa_key_pair(1024).unwrap().split();
        let (_, other_public) = gen_rsa_key_pair(1024).unwrap().split();
        assert!(matches!(
            RsaKeyPair::join(private_key, other_public),
            Err(Error::InvalidKeyField {
                field: KeyField::Modulus,
                ..
            })
        ));
    }

    #[test]
    fn test_unsupported_size() {
        assert!(matches!(gen_rsa_key_pair(1536), Err(Error::UnsupportedKeySize(1536))));
    }
}
