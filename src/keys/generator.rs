//! RSA key-pair generation.

use crate::backend::RsaBackend;
use crate::common::errors::{BackendError, Error, Result};
use crate::keys::context::{KeyPairContext, KeyState};
use crate::keys::policy::ModulusLength;

/// Generates a key pair with a modulus of exactly `modulus` bits.
///
/// The size has already passed the policy. The public exponent is the
/// backend default (65537). Any backend failure is reported as
/// [`Error::KeyGenerationFailed`] with the backend diagnostic as its source;
/// the keygen state and any partly built key are dropped before returning.
pub fn generate<B: RsaBackend>(modulus: ModulusLength) -> Result<KeyPairContext<B>> {
    tracing::debug!(
        backend = B::NAME,
        bits = modulus.bits(),
        "generating RSA key pair"
    );

    let mut keygen = B::alloc_keygen_context(modulus).map_err(generation_failed)?;
    let key = B::run_keygen(&mut keygen).map_err(generation_failed)?;
    drop(keygen);

    let bits = B::modulus_bits(&key);
    if bits != modulus.bits() as usize || !B::has_private(&key) {
        return Err(generation_failed(BackendError::new(
            B::NAME,
            format!(
                "backend produced a {bits}-bit key for a {}-bit request",
                modulus.bits()
            ),
        )));
    }

    tracing::debug!(backend = B::NAME, bits, "generated RSA key pair");
    Ok(KeyPairContext::from_key(key, modulus, KeyState::Generated))
}

fn generation_failed(err: BackendError) -> Error {
    tracing::error!(
        backend = err.backend,
        code = err.code,
        "RSA key generation failed: {}",
        err.message
    );
    Error::KeyGenerationFailed(err)
}

#[cfg(all(test, feature = "rustcrypto"))]
mod tests {
    use super::*;
    use crate::backend::{EncryptionPadding, RustCryptoBackend, SignatureScheme};
    use crate::common::utils::ZeroizingVec;
    use crate::keys::fields::RsaKeyFields;
    use crate::keys::policy::KeySize;

    /// A backend whose generator always fails.
    struct FailingBackend;

    impl RsaBackend for FailingBackend {
        const NAME: &'static str = "failing";
        type KeygenContext = ();
        type Key = ();

        fn alloc_keygen_context(_: ModulusLength) -> Result<(), BackendError> {
            Ok(())
        }

        fn run_keygen(_: &mut ()) -> Result<(), BackendError> {
            Err(BackendError::new("failing", "entropy source exhausted").with_code(42))
        }

        fn construct_key(_: &RsaKeyFields) -> Result<(), BackendError> {
            Err(BackendError::new("failing", "unsupported"))
        }

        fn key_fields(_: &()) -> Result<RsaKeyFields, BackendError> {
            Err(BackendError::new("failing", "unsupported"))
        }

        fn has_private(_: &()) -> bool {
            false
        }

        fn modulus_bits(_: &()) -> usize {
            0
        }

        fn sign(_: &(), _: SignatureScheme, _: &[u8]) -> Result<Vec<u8>, BackendError> {
            Err(BackendError::new("failing", "unsupported"))
        }

        fn verify(_: &(), _: SignatureScheme, _: &[u8], _: &[u8]) -> Result<bool, BackendError> {
            Err(BackendError::new("failing", "unsupported"))
        }

        fn encrypt(_: &(), _: EncryptionPadding, _: &[u8]) -> Result<Vec<u8>, BackendError> {
            Err(BackendError::new("failing", "unsupported"))
        }

        fn decrypt(_: &(), _: EncryptionPadding, _: &[u8]) -> Result<ZeroizingVec, BackendError> {
            Err(BackendError::new("failing", "unsupported"))
        }
    }

    #[test]
    fn test_generate_1024() {
        let ctx = generate::<RustCryptoBackend>(KeySize::Rsa1024.modulus_length()).unwrap();
        assert_eq!(ctx.state(), KeyState::Generated);
        assert_eq!(ctx.modulus_bits().unwrap(), 1024);
        assert!(ctx.has_private().unwrap());
    }

    #[test]
    fn test_backend_failure_is_wrapped() {
        let err = generate::<FailingBackend>(KeySize::Rsa2048.modulus_length()).unwrap_err();
        match err {
            Error::KeyGenerationFailed(source) => {
                assert_eq!(source.backend, "failing");
                assert_eq!(source.code, Some(42));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
