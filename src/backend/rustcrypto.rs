//! Backend over the RustCrypto `rsa` crate.
//!
//! `rsa` keeps only n, e, d and the primes; the CRT values are derived from
//! them whenever they are read out. An imported key whose CRT values do not
//! match the derived ones is rejected, so exporting never silently changes
//! a field.

use rsa::rand_core::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::{EncryptionPadding, HashAlgorithm, RsaBackend, SignaturePadding, SignatureScheme};
use crate::common::errors::BackendError;
use crate::common::utils::ZeroizingVec;
use crate::keys::fields::{PrivateKeyFields, RsaKeyFields, strip_leading_zeros};
use crate::keys::policy::{KeySize, ModulusLength};

const NAME: &str = "rustcrypto";

/// RustCrypto `rsa` backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoBackend;

/// Key handle of [`RustCryptoBackend`]. `RsaPrivateKey` wipes itself on drop.
pub enum RustCryptoKey {
    Private(RsaPrivateKey),
    Public(RsaPublicKey),
}

/// Key-generation state: the requested modulus size.
#[derive(Debug)]
pub struct RustCryptoKeygen {
    bits: usize,
}

fn rsa_error(context: &str, err: rsa::Error) -> BackendError {
    BackendError::new(NAME, format!("{context}: {err}"))
}

fn max_modulus_bits() -> usize {
    KeySize::Rsa4096.bits() as usize
}

/// d mod (p - 1), d mod (q - 1), q^-1 mod p.
///
/// The inverse uses Fermat's little theorem, so `p` has to be prime.
fn crt_values(
    d: &BigUint,
    p: &BigUint,
    q: &BigUint,
) -> (Zeroizing<BigUint>, Zeroizing<BigUint>, Zeroizing<BigUint>) {
    let one = BigUint::from(1u32);
    let two = BigUint::from(2u32);
    let p_minus_one = Zeroizing::new(p - &one);
    let q_minus_one = Zeroizing::new(q - &one);
    let p_minus_two = Zeroizing::new(p - &two);
    let dp = Zeroizing::new(d % &*p_minus_one);
    let dq = Zeroizing::new(d % &*q_minus_one);
    let qinv = Zeroizing::new(q.modpow(&p_minus_two, p));
    (dp, dq, qinv)
}

fn same_value(provided: &[u8], derived: &BigUint) -> bool {
    let derived = Zeroizing::new(derived.to_bytes_be());
    strip_leading_zeros(provided) == strip_leading_zeros(&derived)
}

fn digest(hash: HashAlgorithm, message: &[u8]) -> Vec<u8> {
    match hash {
        HashAlgorithm::Sha256 => Sha256::digest(message).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(message).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(message).to_vec(),
    }
}

fn pss(hash: HashAlgorithm) -> Pss {
    match hash {
        HashAlgorithm::Sha256 => Pss::new::<Sha256>(),
        HashAlgorithm::Sha384 => Pss::new::<Sha384>(),
        HashAlgorithm::Sha512 => Pss::new::<Sha512>(),
    }
}

fn pkcs1v15(hash: HashAlgorithm) -> Pkcs1v15Sign {
    match hash {
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

impl RustCryptoKey {
    fn public_key(&self) -> RsaPublicKey {
        match self {
            RustCryptoKey::Private(key) => key.to_public_key(),
            RustCryptoKey::Public(key) => key.clone(),
        }
    }

    fn private_key(&self, operation: &str) -> Result<&RsaPrivateKey, BackendError> {
        match self {
            RustCryptoKey::Private(key) => Ok(key),
            RustCryptoKey::Public(_) => Err(BackendError::new(
                NAME,
                format!("{operation} requires a private key"),
            )),
        }
    }
}

impl RsaBackend for RustCryptoBackend {
    const NAME: &'static str = NAME;

    type KeygenContext = RustCryptoKeygen;
    type Key = RustCryptoKey;

    fn alloc_keygen_context(modulus: ModulusLength) -> Result<Self::KeygenContext, BackendError> {
        Ok(RustCryptoKeygen {
            bits: modulus.bits() as usize,
        })
    }

    fn run_keygen(ctx: &mut Self::KeygenContext) -> Result<Self::Key, BackendError> {
        let key = RsaPrivateKey::new(&mut OsRng, ctx.bits)
            .map_err(|e| rsa_error("key generation", e))?;
        Ok(RustCryptoKey::Private(key))
    }

    fn construct_key(fields: &RsaKeyFields) -> Result<Self::Key, BackendError> {
        let n = BigUint::from_bytes_be(&fields.modulus);
        let e = BigUint::from_bytes_be(&fields.public_exponent);

        let Some(private) = &fields.private else {
            let key = RsaPublicKey::new_with_max_size(n, e, max_modulus_bits())
                .map_err(|e| rsa_error("public key", e))?;
            return Ok(RustCryptoKey::Public(key));
        };

        let d = BigUint::from_bytes_be(&private.private_exponent);
        let p = BigUint::from_bytes_be(&private.prime1);
        let q = BigUint::from_bytes_be(&private.prime2);
        let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(|e| rsa_error("private key", e))?;
        key.validate().map_err(|e| rsa_error("private key", e))?;

        let primes = key.primes();
        let (dp, dq, qinv) = crt_values(key.d(), &primes[0], &primes[1]);
        if !same_value(&private.exponent1, &dp)
            || !same_value(&private.exponent2, &dq)
            || !same_value(&private.coefficient, &qinv)
        {
            return Err(BackendError::new(
                NAME,
                "CRT parameters are inconsistent with the private exponent and primes",
            ));
        }

        Ok(RustCryptoKey::Private(key))
    }

    fn key_fields(key: &Self::Key) -> Result<RsaKeyFields, BackendError> {
        match key {
            RustCryptoKey::Public(key) => Ok(RsaKeyFields::public(
                key.n().to_bytes_be(),
                key.e().to_bytes_be(),
            )),
            RustCryptoKey::Private(key) => {
                let primes = key.primes();
                if primes.len() != 2 {
                    return Err(BackendError::new(
                        NAME,
                        format!("{}-prime keys are not supported", primes.len()),
                    ));
                }
                let (dp, dq, qinv) = crt_values(key.d(), &primes[0], &primes[1]);
                Ok(RsaKeyFields {
                    modulus: key.n().to_bytes_be(),
                    public_exponent: key.e().to_bytes_be(),
                    private: Some(PrivateKeyFields {
                        private_exponent: key.d().to_bytes_be(),
                        prime1: primes[0].to_bytes_be(),
                        prime2: primes[1].to_bytes_be(),
                        exponent1: dp.to_bytes_be(),
                        exponent2: dq.to_bytes_be(),
                        coefficient: qinv.to_bytes_be(),
                    }),
                })
            }
        }
    }

    fn has_private(key: &Self::Key) -> bool {
        matches!(key, RustCryptoKey::Private(_))
    }

    fn modulus_bits(key: &Self::Key) -> usize {
        match key {
            RustCryptoKey::Private(key) => key.n().bits(),
            RustCryptoKey::Public(key) => key.n().bits(),
        }
    }

    fn sign(
        key: &Self::Key,
        scheme: SignatureScheme,
        message: &[u8],
    ) -> Result<Vec<u8>, BackendError> {
        let key = key.private_key("signing")?;
        let hashed = digest(scheme.hash, message);
        let signature = match scheme.padding {
            SignaturePadding::Pss => key.sign_with_rng(&mut OsRng, pss(scheme.hash), &hashed),
            SignaturePadding::Pkcs1v15 => key.sign(pkcs1v15(scheme.hash), &hashed),
        };
        signature.map_err(|e| rsa_error("signing", e))
    }

    fn verify(
        key: &Self::Key,
        scheme: SignatureScheme,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, BackendError> {
        let public = key.public_key();
        let hashed = digest(scheme.hash, message);
        let result = match scheme.padding {
            SignaturePadding::Pss => public.verify(pss(scheme.hash), &hashed, signature),
            SignaturePadding::Pkcs1v15 => public.verify(pkcs1v15(scheme.hash), &hashed, signature),
        };
        match result {
            Ok(()) => Ok(true),
            Err(rsa::Error::Verification) => Ok(false),
            Err(e) => Err(rsa_error("verification", e)),
        }
    }

    fn encrypt(
        key: &Self::Key,
        padding: EncryptionPadding,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, BackendError> {
        let public = key.public_key();
        let ciphertext = match padding {
            EncryptionPadding::OaepSha256 => {
                public.encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            }
            EncryptionPadding::Pkcs1v15 => public.encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext),
        };
        ciphertext.map_err(|e| rsa_error("encryption", e))
    }

    fn decrypt(
        key: &Self::Key,
        padding: EncryptionPadding,
        ciphertext: &[u8],
    ) -> Result<ZeroizingVec, BackendError> {
        let key = key.private_key("decryption")?;
        let plaintext = match padding {
            EncryptionPadding::OaepSha256 => key.decrypt(Oaep::new::<Sha256>(), ciphertext),
            EncryptionPadding::Pkcs1v15 => key.decrypt(Pkcs1v15Encrypt, ciphertext),
        };
        plaintext
            .map(ZeroizingVec)
            .map_err(|e| rsa_error("decryption", e))
    }
}
