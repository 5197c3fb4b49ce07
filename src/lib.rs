//! # Seal-RSA: RSA key lifecycle for seal-kit
//!
//! `seal-rsa` manages RSA key material on top of interchangeable crypto
//! backends: it checks key sizes against a fixed policy, generates key pairs,
//! and moves keys in and out of a versioned, self-describing key container.
//!
//! ## Core Concepts
//!
//! - **`KeyPairContext`**: an RSA key owned by a backend, with an explicit
//!   lifecycle (`Empty`, `Generated`/`Imported`, `Exported`, `Released`).
//!   Private material is cleared when the context is released or dropped.
//! - **`KeyContainer`**: the serialized form of a public or private key.
//! - **`RsaBackend`**: the engine doing the math. It is chosen at build time
//!   with Cargo features (`rustcrypto`, `openssl-backend`).
//! - **`SignContext`** / **`CipherContext`**: a key bound to one signature
//!   scheme or encryption padding.
//!
//! ## Quick Start
//!
//! ```rust
//! use seal_rsa::{Error, export_rsa_key, generate_rsa_key, import_rsa_key};
//!
//! fn main() -> seal_rsa::Result<()> {
//!     let mut key = generate_rsa_key(2048)?;
//!
//!     // Ask for the size first, then fill.
//!     let required = match export_rsa_key(&mut key, true, &mut []) {
//!         Err(Error::BufferTooSmall { required, .. }) => required,
//!         other => panic!("unexpected: {other:?}"),
//!     };
//!     let mut container = vec![0u8; required];
//!     export_rsa_key(&mut key, true, &mut container)?;
//!
//!     let restored = import_rsa_key(&container, true)?;
//!     assert_eq!(restored.fields()?, key.fields()?);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod common;
pub mod engines;
pub mod keygen;
pub mod keys;
pub mod systems;

pub use backend::{
    DefaultBackend, EncryptionPadding, HashAlgorithm, RsaBackend, SignaturePadding,
    SignatureScheme,
};
#[cfg(feature = "openssl-backend")]
pub use backend::OpensslBackend;
#[cfg(feature = "rustcrypto")]
pub use backend::RustCryptoBackend;
pub use common::{BackendError, ConfigFile, Error, KeyConfig, Result, ZeroizingVec};
pub use keygen::{RsaKeyPair, gen_rsa_key_pair};
pub use keys::{
    KeyContainer, KeyKind, KeyPairContext, KeySize, KeyState, ModulusLength, detect_key_kind,
    validate_and_normalize, validate_key_container,
};
pub use systems::{CipherContext, SignContext};

/// Generates an RSA key pair of `bits` bits with the default backend.
///
/// Fails with [`Error::UnsupportedKeySize`] before touching the backend when
/// `bits` is not a supported size.
pub fn generate_rsa_key(bits: u32) -> Result<KeyPairContext> {
    KeyPairContext::generate(bits)
}

/// Rebuilds a key from a container with the default backend.
pub fn import_rsa_key(bytes: &[u8], expect_private: bool) -> Result<KeyPairContext> {
    KeyPairContext::import(bytes, expect_private)
}

/// Writes `context` into `buffer` and returns the number of bytes written.
///
/// When `buffer` is too short nothing is written and the exact length comes
/// back in [`Error::BufferTooSmall`].
pub fn export_rsa_key(
    context: &mut KeyPairContext,
    include_private: bool,
    buffer: &mut [u8],
) -> Result<usize> {
    context.export(include_private, buffer)
}
