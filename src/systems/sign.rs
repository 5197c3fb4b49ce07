//! RSA signing context.

use crate::backend::{DefaultBackend, RsaBackend, SignatureScheme};
use crate::common::errors::{Error, Result};
use crate::keys::container::KeyContainer;
use crate::keys::context::KeyPairContext;

/// A key pair bound to one signature scheme.
///
/// The context owns its key for its whole life. Signing with another key
/// means building another context.
#[derive(Debug)]
pub struct SignContext<B: RsaBackend = DefaultBackend> {
    key: KeyPairContext<B>,
    scheme: SignatureScheme,
}

impl<B: RsaBackend> SignContext<B> {
    pub fn new(key: KeyPairContext<B>, scheme: SignatureScheme) -> Self {
        Self { key, scheme }
    }

    /// Generates a new key pair for this scheme.
    pub fn generate(bits: u32, scheme: SignatureScheme) -> Result<Self> {
        Ok(Self::new(KeyPairContext::generate(bits)?, scheme))
    }

    /// Imports a key from a container. A public key is enough for verifying.
    pub fn import(bytes: &[u8], expect_private: bool, scheme: SignatureScheme) -> Result<Self> {
        Ok(Self::new(KeyPairContext::import(bytes, expect_private)?, scheme))
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    /// Signs `message`. Needs private key material.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let key = self.key.key()?;
        if !B::has_private(key) {
            return Err(Error::PrivateMaterialUnavailable);
        }
        B::sign(key, self.scheme, message).map_err(Error::Backend)
    }

    /// Checks `signature` over `message`.
    ///
    /// A signature that does not match is [`Error::VerificationFailed`].
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let key = self.key.key()?;
        if B::verify(key, self.scheme, message, signature).map_err(Error::Backend)? {
            Ok(())
        } else {
            tracing::debug!(scheme = ?self.scheme, "signature did not verify");
            Err(Error::VerificationFailed)
        }
    }

    pub fn export(&mut self, include_private: bool, buffer: &mut [u8]) -> Result<usize> {
        self.key.export(include_private, buffer)
    }

    pub fn export_to_vec(&mut self, include_private: bool) -> Result<KeyContainer> {
        self.key.export_to_vec(include_private)
    }

    pub fn key(&self) -> &KeyPairContext<B> {
        &self.key
    }

    pub fn into_key(self) -> KeyPairContext<B> {
        self.key
    }
}

#[cfg(all(test, feature = "rustcrypto"))]
mod tests {
    use super::*;
    use crate::backend::{HashAlgorithm, RustCryptoBackend, SignaturePadding};

    type Signer = SignContext<RustCryptoBackend>;

    #[test]
    fn test_sign_and_verify_with_public_copy() {
        let mut signer = Signer::generate(1024, SignatureScheme::PSS_SHA256).unwrap();
        let signature = signer.sign(b"payload").unwrap();

        let public = signer.export_to_vec(false).unwrap();
        let verifier = Signer::import(public.as_bytes(), false, signer.scheme()).unwrap();
        verifier.verify(b"payload", &signature).unwrap();
        assert!(matches!(
            verifier.verify(b"tampered", &signature),
            Err(Error::VerificationFailed)
        ));
        assert!(matches!(
            verifier.sign(b"payload"),
            Err(Error::PrivateMaterialUnavailable)
        ));
    }

    #[test]
    fn test_scheme_mismatch_fails_verification() {
        let key = KeyPairContext::<RustCryptoBackend>::generate(1024).unwrap();
        let signer = Signer::new(key, SignatureScheme::PKCS1V15_SHA256);
        let signature = signer.sign(b"payload").unwrap();

        let key = signer.into_key();
        let verifier = Signer::new(
            key,
            SignatureScheme::new(HashAlgorithm::Sha384, SignaturePadding::Pkcs1v15),
        );
        assert!(matches!(
            verifier.verify(b"payload", &signature),
            Err(Error::VerificationFailed)
        ));
    }

    #[test]
    fn test_released_key() {
        let mut key = KeyPairContext::<RustCryptoBackend>::generate(1024).unwrap();
        key.release().unwrap();
        let signer = Signer::new(key, SignatureScheme::default());
        assert!(matches!(signer.sign(b"m"), Err(Error::UseAfterRelease)));
        assert!(matches!(signer.verify(b"m", b"s"), Err(Error::UseAfterRelease)));
    }
}
