//! Rebuilding backend keys from key containers.

use crate::backend::RsaBackend;
use crate::common::errors::{Error, Result};
use crate::keys::container::{KeyKind, RawContainer, detect_key_kind};
use crate::keys::context::{KeyPairContext, KeyState};

/// Parses `bytes` and hands the validated components to backend `B`.
///
/// Checks run in this order, each failing with its own error:
///
/// 1. header tag and declared length (`MalformedKeyContainer`)
/// 2. container kind against `expect_private` (`KeyTypeMismatch`)
/// 3. field walk, no trailing bytes (`MalformedKeyContainer`)
/// 4. field values against the size policy (`InvalidKeyField`)
/// 5. backend construction (`BackendRejectedKey`)
///
/// Private components are staged in a buffer that is wiped on every return
/// path, and nothing is allocated in the backend before step 5.
pub fn import<B: RsaBackend>(bytes: &[u8], expect_private: bool) -> Result<KeyPairContext<B>> {
    let found = detect_key_kind(bytes).inspect_err(log_rejection)?;
    let expected = KeyKind::from_private(expect_private);
    if found != expected {
        tracing::warn!(%expected, %found, "key container of the wrong kind");
        return Err(Error::KeyTypeMismatch { expected, found });
    }

    let raw = RawContainer::parse(bytes).inspect_err(log_rejection)?;
    let modulus = raw.validate().inspect_err(log_rejection)?;

    let staged = raw.to_fields();
    let key = B::construct_key(&staged).map_err(|err| {
        tracing::warn!(
            backend = err.backend,
            code = err.code,
            "backend rejected key: {}",
            err.message
        );
        Error::BackendRejectedKey(err)
    })?;
    drop(staged);

    tracing::debug!(
        backend = B::NAME,
        kind = %found,
        bits = modulus.bits(),
        "imported RSA key"
    );
    Ok(KeyPairContext::from_key(key, modulus, KeyState::Imported))
}

fn log_rejection(err: &Error) {
    tracing::warn!(error = %err, "rejected key container");
}
