//! Key generation on the tokio blocking pool.

use crate::backend::RsaBackend;
use crate::common::errors::Result;
use crate::keys::context::KeyPairContext;
use crate::keys::policy::validate_and_normalize;
use crate::keys::{generator, importer};

/// Generates a key pair on a blocking worker thread.
///
/// The size is checked before a worker is scheduled. Dropping the returned
/// future does not stop the worker; the generated key is released as soon
/// as it finishes.
pub async fn generate_rsa_key_async<B: RsaBackend>(bits: u32) -> Result<KeyPairContext<B>> {
    let modulus = validate_and_normalize(bits)?;
    tokio::task::spawn_blocking(move || generator::generate::<B>(modulus)).await?
}

/// Imports a key container on a blocking worker thread.
pub async fn import_rsa_key_async<B: RsaBackend>(
    bytes: Vec<u8>,
    expect_private: bool,
) -> Result<KeyPairContext<B>> {
    let bytes = zeroize::Zeroizing::new(bytes);
    tokio::task::spawn_blocking(move || importer::import::<B>(&bytes, expect_private)).await?
}
