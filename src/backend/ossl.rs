//! Backend over OpenSSL.
//!
//! OpenSSL stores the CRT values with the key, so they round-trip exactly as
//! imported. `RSA_check_key` is run on every imported private key.

use openssl::bn::{BigNum, BigNumRef};
use openssl::encrypt::{Decrypter, Encrypter};
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkey::{HasPrivate, HasPublic, PKey, PKeyRef, Private, Public};
use openssl::rsa::{Padding, Rsa};
use openssl::sign::{RsaPssSaltlen, Signer, Verifier};

use super::{EncryptionPadding, HashAlgorithm, RsaBackend, SignaturePadding, SignatureScheme};
use crate::common::errors::BackendError;
use crate::common::utils::ZeroizingVec;
use crate::keys::fields::{PrivateKeyFields, RsaKeyFields};
use crate::keys::policy::{DEFAULT_PUBLIC_EXPONENT, ModulusLength};

const NAME: &str = "openssl";

/// OpenSSL backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpensslBackend;

/// Key handle of [`OpensslBackend`]. OpenSSL clear-frees the private
/// components when the key is freed.
pub enum OsslKey {
    Private(PKey<Private>),
    Public(PKey<Public>),
}

/// Key-generation state.
pub struct OsslKeygen {
    bits: u32,
    exponent: BigNum,
}

fn ossl_error(context: &str, err: ErrorStack) -> BackendError {
    tracing::error!(?err, context, "openssl error stack");
    let error = BackendError::new(NAME, format!("{context}: {err}"));
    match err.errors().first() {
        Some(first) => error.with_code(first.code() as u64),
        None => error,
    }
}

fn bn(value: &[u8]) -> Result<BigNum, BackendError> {
    BigNum::from_slice(value).map_err(|e| ossl_error("big number", e))
}

fn crt_component(value: Option<&BigNumRef>, name: &str) -> Result<Vec<u8>, BackendError> {
    value
        .map(BigNumRef::to_vec)
        .ok_or_else(|| BackendError::new(NAME, format!("key has no {name} component")))
}

fn message_digest(hash: HashAlgorithm) -> MessageDigest {
    match hash {
        HashAlgorithm::Sha256 => MessageDigest::sha256(),
        HashAlgorithm::Sha384 => MessageDigest::sha384(),
        HashAlgorithm::Sha512 => MessageDigest::sha512(),
    }
}

fn sign_with<T: HasPrivate>(
    pkey: &PKeyRef<T>,
    scheme: SignatureScheme,
    message: &[u8],
) -> Result<Vec<u8>, ErrorStack> {
    let md = message_digest(scheme.hash);
    let mut signer = Signer::new(md, pkey)?;
    match scheme.padding {
        SignaturePadding::Pss => {
            signer.set_rsa_padding(Padding::PKCS1_PSS)?;
            signer.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)?;
            signer.set_rsa_mgf1_md(md)?;
        }
        SignaturePadding::Pkcs1v15 => signer.set_rsa_padding(Padding::PKCS1)?,
    }
    signer.update(message)?;
    signer.sign_to_vec()
}

fn verify_with<T: HasPublic>(
    pkey: &PKeyRef<T>,
    scheme: SignatureScheme,
    message: &[u8],
    signature: &[u8],
) -> Result<bool, ErrorStack> {
    let md = message_digest(scheme.hash);
    let mut verifier = Verifier::new(md, pkey)?;
    match scheme.padding {
        SignaturePadding::Pss => {
            verifier.set_rsa_padding(Padding::PKCS1_PSS)?;
            verifier.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)?;
            verifier.set_rsa_mgf1_md(md)?;
        }
        SignaturePadding::Pkcs1v15 => verifier.set_rsa_padding(Padding::PKCS1)?,
    }
    verifier.update(message)?;
    verifier.verify(signature)
}

fn encrypt_with<T: HasPublic>(
    pkey: &PKeyRef<T>,
    padding: EncryptionPadding,
    plaintext: &[u8],
) -> Result<Vec<u8>, ErrorStack> {
    let mut encrypter = Encrypter::new(pkey)?;
    match padding {
        EncryptionPadding::OaepSha256 => {
            encrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
            encrypter.set_rsa_oaep_md(MessageDigest::sha256())?;
            encrypter.set_rsa_mgf1_md(MessageDigest::sha256())?;
        }
        EncryptionPadding::Pkcs1v15 => encrypter.set_rsa_padding(Padding::PKCS1)?,
    }
    let mut out = vec![0u8; encrypter.encrypt_len(plaintext)?];
    let written = encrypter.encrypt(plaintext, &mut out)?;
    out.truncate(written);
    Ok(out)
}

fn decrypt_with<T: HasPrivate>(
    pkey: &PKeyRef<T>,
    padding: EncryptionPadding,
    ciphertext: &[u8],
) -> Result<ZeroizingVec, ErrorStack> {
    let mut decrypter = Decrypter::new(pkey)?;
    match padding {
        EncryptionPadding::OaepSha256 => {
            decrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
            decrypter.set_rsa_oaep_md(MessageDigest::sha256())?;
            decrypter.set_rsa_mgf1_md(MessageDigest::sha256())?;
        }
        EncryptionPadding::Pkcs1v15 => decrypter.set_rsa_padding(Padding::PKCS1)?,
    }
    let mut out = ZeroizingVec::with_len(decrypter.decrypt_len(ciphertext)?);
    let written = decrypter.decrypt(ciphertext, &mut out.0)?;
    out.0.truncate(written);
    Ok(out)
}

impl RsaBackend for OpensslBackend {
    const NAME: &'static str = NAME;

    type KeygenContext = OsslKeygen;
    type Key = OsslKey;

    fn alloc_keygen_context(modulus: ModulusLength) -> Result<Self::KeygenContext, BackendError> {
        let exponent = BigNum::from_u32(DEFAULT_PUBLIC_EXPONENT)
            .map_err(|e| ossl_error("public exponent", e))?;
        Ok(OsslKeygen {
            bits: modulus.bits(),
            exponent,
        })
    }

    fn run_keygen(ctx: &mut Self::KeygenContext) -> Result<Self::Key, BackendError> {
        let rsa = Rsa::generate_with_e(ctx.bits, &ctx.exponent)
            .map_err(|e| ossl_error("key generation", e))?;
        let pkey = PKey::from_rsa(rsa).map_err(|e| ossl_error("key generation", e))?;
        Ok(OsslKey::Private(pkey))
    }

    fn construct_key(fields: &RsaKeyFields) -> Result<Self::Key, BackendError> {
        let n = bn(&fields.modulus)?;
        let e = bn(&fields.public_exponent)?;

        let Some(private) = &fields.private else {
            let rsa = Rsa::from_public_components(n, e)
                .map_err(|e| ossl_error("public key", e))?;
            let pkey = PKey::from_rsa(rsa).map_err(|e| ossl_error("public key", e))?;
            return Ok(OsslKey::Public(pkey));
        };

        let rsa = Rsa::from_private_components(
            n,
            e,
            bn(&private.private_exponent)?,
            bn(&private.prime1)?,
            bn(&private.prime2)?,
            bn(&private.exponent1)?,
            bn(&private.exponent2)?,
            bn(&private.coefficient)?,
        )
        .map_err(|e| ossl_error("private key", e))?;

        if !rsa.check_key().map_err(|e| ossl_error("key check", e))? {
            return Err(BackendError::new(NAME, "RSA_check_key rejected the key"));
        }

        let pkey = PKey::from_rsa(rsa).map_err(|e| ossl_error("private key", e))?;
        Ok(OsslKey::Private(pkey))
    }

    fn key_fields(key: &Self::Key) -> Result<RsaKeyFields, BackendError> {
        match key {
            OsslKey::Public(pkey) => {
                let rsa = pkey.rsa().map_err(|e| ossl_error("public key", e))?;
                Ok(RsaKeyFields::public(rsa.n().to_vec(), rsa.e().to_vec()))
            }
            OsslKey::Private(pkey) => {
                let rsa = pkey.rsa().map_err(|e| ossl_error("private key", e))?;
                Ok(RsaKeyFields {
                    modulus: rsa.n().to_vec(),
                    public_exponent: rsa.e().to_vec(),
                    private: Some(PrivateKeyFields {
                        private_exponent: rsa.d().to_vec(),
                        prime1: crt_component(rsa.p(), "p")?,
                        prime2: crt_component(rsa.q(), "q")?,
                        exponent1: crt_component(rsa.dmp1(), "dmp1")?,
                        exponent2: crt_component(rsa.dmq1(), "dmq1")?,
                        coefficient: crt_component(rsa.iqmp(), "iqmp")?,
                    }),
                })
            }
        }
    }

    fn has_private(key: &Self::Key) -> bool {
        matches!(key, OsslKey::Private(_))
    }

    fn modulus_bits(key: &Self::Key) -> usize {
        match key {
            OsslKey::Private(pkey) => pkey.bits() as usize,
            OsslKey::Public(pkey) => pkey.bits() as usize,
        }
    }

    fn sign(
        key: &Self::Key,
        scheme: SignatureScheme,
        message: &[u8],
    ) -> Result<Vec<u8>, BackendError> {
        match key {
            OsslKey::Private(pkey) => {
                sign_with(pkey, scheme, message).map_err(|e| ossl_error("signing", e))
            }
            OsslKey::Public(_) => Err(BackendError::new(NAME, "signing requires a private key")),
        }
    }

    fn verify(
        key: &Self::Key,
        scheme: SignatureScheme,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, BackendError> {
        let result = match key {
            OsslKey::Private(pkey) => verify_with(pkey, scheme, message, signature),
            OsslKey::Public(pkey) => verify_with(pkey, scheme, message, signature),
        };
        result.map_err(|e| ossl_error("verification", e))
    }

    fn encrypt(
        key: &Self::Key,
        padding: EncryptionPadding,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, BackendError> {
        let result = match key {
            OsslKey::Private(pkey) => encrypt_with(pkey, padding, plaintext),
            OsslKey::Public(pkey) => encrypt_with(pkey, padding, plaintext),
        };
        result.map_err(|e| ossl_error("encryption", e))
    }

    fn decrypt(
        key: &Self::Key,
        padding: EncryptionPadding,
        ciphertext: &[u8],
    ) -> Result<ZeroizingVec, BackendError> {
        match key {
            OsslKey::Private(pkey) => {
                decrypt_with(pkey, padding, ciphertext).map_err(|e| ossl_error("decryption", e))
            }
            OsslKey::Public(_) => Err(BackendError::new(NAME, "decryption requires a private key")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::policy::KeySize;

    fn generate_1024() -> OsslKey {
        let mut ctx =
            OpensslBackend::alloc_keygen_context(KeySize::Rsa1024.modulus_length()).unwrap();
        OpensslBackend::run_keygen(&mut ctx).unwrap()
    }

    #[test]
    fn test_generated_key_shape() {
        let key = generate_1024();
        assert!(OpensslBackend::has_private(&key));
        assert_eq!(OpensslBackend::modulus_bits(&key), 1024);
        let fields = OpensslBackend::key_fields(&key).unwrap();
        assert_eq!(fields.public_exponent, vec![0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_construct_from_own_fields() {
        let key = generate_1024();
        let fields = OpensslBackend::key_fields(&key).unwrap();
        let rebuilt = OpensslBackend::construct_key(&fields).unwrap();
        assert_eq!(OpensslBackend::key_fields(&rebuilt).unwrap(), fields);
    }

    #[test]
    fn test_check_key_rejects_mismatched_prime() {
        let key = generate_1024();
        let other = generate_1024();
        let mut fields = OpensslBackend::key_fields(&key).unwrap();
        fields.private.as_mut().unwrap().prime1 = OpensslBackend::key_fields(&other)
            .unwrap()
            .private
            .as_ref()
            .unwrap()
            .prime1
            .clone();
        assert!(OpensslBackend::construct_key(&fields).is_err());
    }

    #[test]
    fn test_sign_verify_and_encrypt_decrypt() {
        let key = generate_1024();
        let scheme = SignatureScheme::PSS_SHA256;
        let signature = OpensslBackend::sign(&key, scheme, b"message").unwrap();
        assert!(OpensslBackend::verify(&key, scheme, b"message", &signature).unwrap());

        let ciphertext =
            OpensslBackend::encrypt(&key, EncryptionPadding::OaepSha256, b"secret").unwrap();
        let plaintext =
            OpensslBackend::decrypt(&key, EncryptionPadding::OaepSha256, &ciphertext).unwrap();
        assert_eq!(&*plaintext, b"secret");
    }
}
