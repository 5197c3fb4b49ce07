//! Serializing backend keys into key containers.
//!
//! Export follows a size-then-fill protocol: a caller that does not know the
//! container length passes an empty buffer, reads the exact length from
//! [`Error::BufferTooSmall`] and calls again.

use crate::backend::RsaBackend;
use crate::common::errors::{Error, Result};
use crate::common::utils::ZeroizingVec;
use crate::keys::container::{KeyContainer, KeyKind, encode_into, encoded_len};
use crate::keys::context::KeyPairContext;
use crate::keys::fields::{RsaKeyFields, strip_leading_zeros};
use crate::keys::policy::ModulusLength;

/// Fields read out of a context once per export, with the container shape
/// they encode to.
struct Staged {
    fields: RsaKeyFields,
    modulus: ModulusLength,
    kind: KeyKind,
    len: usize,
}

fn stage<B: RsaBackend>(ctx: &KeyPairContext<B>, include_private: bool) -> Result<Staged> {
    let key = ctx.key()?;
    if include_private && !B::has_private(key) {
        tracing::warn!(
            backend = B::NAME,
            "private export requested for a public key"
        );
        return Err(Error::PrivateMaterialUnavailable);
    }

    let modulus = ctx.modulus_length()?;
    let kind = KeyKind::from_private(include_private);
    let fields = B::key_fields(key).map_err(Error::Backend)?;
    let exponent_len = strip_leading_zeros(&fields.public_exponent).len();
    let len = encoded_len(modulus, exponent_len, kind);
    Ok(Staged {
        fields,
        modulus,
        kind,
        len,
    })
}

fn write<B: RsaBackend>(
    ctx: &mut KeyPairContext<B>,
    staged: Staged,
    buffer: &mut [u8],
) -> Result<usize> {
    let written = encode_into(
        &staged.fields,
        staged.modulus,
        staged.kind,
        &mut buffer[..staged.len],
    )?;
    drop(staged.fields);

    ctx.mark_exported();
    tracing::debug!(backend = B::NAME, kind = %staged.kind, len = written, "exported RSA key");
    Ok(written)
}

/// Writes the key held by `ctx` into the start of `buffer` and returns the
/// number of bytes written.
///
/// Nothing is written when `buffer` is too short. Exporting the same context
/// twice produces identical bytes.
pub fn export<B: RsaBackend>(
    ctx: &mut KeyPairContext<B>,
    include_private: bool,
    buffer: &mut [u8],
) -> Result<usize> {
    let staged = stage(ctx, include_private)?;
    if buffer.len() < staged.len {
        tracing::debug!(
            required = staged.len,
            provided = buffer.len(),
            "export buffer too small"
        );
        return Err(Error::BufferTooSmall {
            required: staged.len,
            provided: buffer.len(),
        });
    }
    write(ctx, staged, buffer)
}

/// Exports into a new [`KeyContainer`] of exactly the right size.
pub fn export_to_vec<B: RsaBackend>(
    ctx: &mut KeyPairContext<B>,
    include_private: bool,
) -> Result<KeyContainer> {
    let staged = stage(ctx, include_private)?;
    let kind = staged.kind;
    let mut bytes = ZeroizingVec::with_len(staged.len);
    write(ctx, staged, &mut bytes.0)?;
    Ok(KeyContainer::from_encoded(kind, bytes))
}
