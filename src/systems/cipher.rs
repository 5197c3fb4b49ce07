//! RSA encryption context.

use crate::backend::{DefaultBackend, EncryptionPadding, RsaBackend};
use crate::common::errors::{Error, Result};
use crate::common::utils::ZeroizingVec;
use crate::keys::container::KeyContainer;
use crate::keys::context::KeyPairContext;

/// A key pair bound to one encryption padding.
#[derive(Debug)]
pub struct CipherContext<B: RsaBackend = DefaultBackend> {
    key: KeyPairContext<B>,
    padding: EncryptionPadding,
}

impl<B: RsaBackend> CipherContext<B> {
    pub fn new(key: KeyPairContext<B>, padding: EncryptionPadding) -> Self {
        Self { key, padding }
    }

    pub fn generate(bits: u32, padding: EncryptionPadding) -> Result<Self> {
        Ok(Self::new(KeyPairContext::generate(bits)?, padding))
    }

    pub fn import(bytes: &[u8], expect_private: bool, padding: EncryptionPadding) -> Result<Self> {
        Ok(Self::new(KeyPairContext::import(bytes, expect_private)?, padding))
    }

    pub fn padding(&self) -> EncryptionPadding {
        self.padding
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        B::encrypt(self.key.key()?, self.padding, plaintext).map_err(Error::Backend)
    }

    /// Decrypts into a buffer that is wiped on drop. Needs private key material.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<ZeroizingVec> {
        let key = self.key.key()?;
        if !B::has_private(key) {
            return Err(Error::PrivateMaterialUnavailable);
        }
        B::decrypt(key, self.padding, ciphertext).map_err(Error::Backend)
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
    use crate::backend::RustCryptoBackend;

    type Cipher = CipherContext<RustCryptoBackend>;

    #[test]
    fn test_encrypt_with_public_decrypt_with_private() {
        let mut private = Cipher::generate(1024, EncryptionPadding::OaepSha256).unwrap();
        let public_bytes = private.export_to_vec(false).unwrap();
        let public = Cipher::import(public_bytes.as_bytes(), false, private.padding()).unwrap();

        let ciphertext = public.encrypt(b"session key").unwrap();
        assert_eq!(ciphertext.len(), 128);
        let plaintext = private.decrypt(&ciphertext).unwrap();
        assert_eq!(&*plaintext, b"session key");

        assert!(matches!(
            public.decrypt(&ciphertext),
            Err(Error::PrivateMaterialUnavailable)
        ));
    }

    #[test]
    fn test_corrupted_ciphertext_is_a_backend_error() {
        let cipher = Cipher::generate(1024, EncryptionPadding::OaepSha256).unwrap();
        let mut ciphertext = cipher.encrypt(b"data").unwrap();
        ciphertext[0] ^= 0xFF;
        ciphertext[64] ^= 0xFF;
        assert!(matches!(cipher.decrypt(&ciphertext), Err(Error::Backend(_))));
    }

    #[test]
    fn test_plaintext_too_long() {
        let cipher = Cipher::generate(1024, EncryptionPadding::OaepSha256).unwrap();
        assert!(matches!(cipher.encrypt(&[0u8; 128]), Err(Error::Backend(_))));
    }
}
