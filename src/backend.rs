//! Backend engines.
//!
//! A backend performs the actual big-number work: generating key pairs,
//! building keys from raw components and running the private/public key
//! operations. The rest of the crate only talks to it through
//! [`RsaBackend`] and never looks inside its handles.
//!
//! The backend is picked at build time with Cargo features and every public
//! type takes it as a generic parameter defaulting to [`DefaultBackend`], so
//! there is no per-call dispatch.
//!
//! | feature           | backend                |
//! |-------------------|------------------------|
//! | `rustcrypto`      | [`RustCryptoBackend`]  |
//! | `openssl-backend` | [`OpensslBackend`]     |
//!
//! When both are enabled `rustcrypto` is the default.

#[cfg(feature = "openssl-backend")]
mod ossl;
#[cfg(feature = "rustcrypto")]
mod rustcrypto;

#[cfg(feature = "openssl-backend")]
pub use self::ossl::OpensslBackend;
#[cfg(feature = "rustcrypto")]
pub use self::rustcrypto::RustCryptoBackend;

use serde::{Deserialize, Serialize};

use crate::common::errors::BackendError;
use crate::common::utils::ZeroizingVec;
use crate::keys::fields::RsaKeyFields;
use crate::keys::policy::ModulusLength;

#[cfg(feature = "rustcrypto")]
pub type DefaultBackend = RustCryptoBackend;

#[cfg(all(feature = "openssl-backend", not(feature = "rustcrypto")))]
pub type DefaultBackend = OpensslBackend;

#[cfg(not(any(feature = "rustcrypto", feature = "openssl-backend")))]
compile_error!("enable at least one backend feature: `rustcrypto` or `openssl-backend`");

/// Digest used by signature schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

/// Signature padding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignaturePadding {
    /// RSASSA-PSS with MGF1 over the same digest and a digest-sized salt.
    #[default]
    Pss,
    /// RSASSA-PKCS1-v1_5.
    Pkcs1v15,
}

/// Hash algorithm plus padding mode of a signing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SignatureScheme {
    pub hash: HashAlgorithm,
    pub padding: SignaturePadding,
}

impl SignatureScheme {
    pub const PSS_SHA256: Self = Self::new(HashAlgorithm::Sha256, SignaturePadding::Pss);
    pub const PKCS1V15_SHA256: Self = Self::new(HashAlgorithm::Sha256, SignaturePadding::Pkcs1v15);

    pub const fn new(hash: HashAlgorithm, padding: SignaturePadding) -> Self {
        Self { hash, padding }
    }
}

/// Padding mode of a cipher context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionPadding {
    /// RSAES-OAEP with SHA-256 and MGF1-SHA-256.
    #[default]
    OaepSha256,
    /// RSAES-PKCS1-v1_5.
    Pkcs1v15,
}

/// The capability interface a backend engine provides.
///
/// `Key` owns the backend-native key. Dropping it must release the backend
/// object and clear any private material it holds.
pub trait RsaBackend: Sized + 'static {
    /// Short name used in diagnostics.
    const NAME: &'static str;

    /// State prepared for one key-generation run.
    type KeygenContext: Send;

    /// Backend-native key handle.
    ///
    /// Handles are never duplicated; a key belongs to exactly one context.
    ///
    /// ```compile_fail
    /// use seal_rsa::{DefaultBackend, RsaBackend};
    ///
    /// fn duplicate(
    ///     key: &<DefaultBackend as RsaBackend>::Key,
    /// ) -> <DefaultBackend as RsaBackend>::Key {
    ///     key.clone()
    /// }
    /// ```
    type Key: Send + Sync;

    /// Prepares a key-generation run for a validated modulus length.
    fn alloc_keygen_context(modulus: ModulusLength) -> Result<Self::KeygenContext, BackendError>;

    /// Generates a fresh key pair with the default public exponent.
    fn run_keygen(ctx: &mut Self::KeygenContext) -> Result<Self::Key, BackendError>;

    /// Builds a key from validated components. Public-only when
    /// `fields.private` is `None`.
    fn construct_key(fields: &RsaKeyFields) -> Result<Self::Key, BackendError>;

    /// Reads the components back out of a key.
    fn key_fields(key: &Self::Key) -> Result<RsaKeyFields, BackendError>;

    fn has_private(key: &Self::Key) -> bool;

    /// Bit length of the modulus.
    fn modulus_bits(key: &Self::Key) -> usize;

    fn sign(
        key: &Self::Key,
        scheme: SignatureScheme,
        message: &[u8],
    ) -> Result<Vec<u8>, BackendError>;

    /// Returns `Ok(false)` for a well-formed but non-matching signature.
    fn verify(
        key: &Self::Key,
        scheme: SignatureScheme,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, BackendError>;

    fn encrypt(
        key: &Self::Key,
        padding: EncryptionPadding,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, BackendError>;

    fn decrypt(
        key: &Self::Key,
        padding: EncryptionPadding,
        ciphertext: &[u8],
    ) -> Result<ZeroizingVec, BackendError>;
}
