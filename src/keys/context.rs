//! The Key Pair Context and its state machine.
//!
//! ```text
//! Empty ──generate──▶ Generated ──export──▶ Exported ──export──▶ Exported
//!   └────import────▶ Imported  ──export──┘
//! any state ──release / drop──▶ Released
//! ```
//!
//! `Released` is terminal. Every operation on a released context fails with
//! [`Error::UseAfterRelease`].

use std::fmt;
use std::marker::PhantomData;

use crate::backend::{DefaultBackend, RsaBackend};
use crate::common::errors::{Error, Result};
use crate::keys::container::{KeyContainer, KeyKind, encoded_len};
use crate::keys::fields::{RsaKeyFields, strip_leading_zeros};
use crate::keys::policy::{ModulusLength, validate_and_normalize};
use crate::keys::{exporter, generator, importer};

/// Lifecycle state of a [`KeyPairContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    Empty,
    Generated,
    Imported,
    Exported,
    Released,
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyState::Empty => "empty",
            KeyState::Generated => "generated",
            KeyState::Imported => "imported",
            KeyState::Exported => "exported",
            KeyState::Released => "released",
        };
        f.write_str(name)
    }
}

/// An RSA key held by a backend.
///
/// The context exclusively owns its backend key. Releasing it, explicitly or
/// by dropping the context, frees the backend object and clears the private
/// exponent and CRT values.
///
/// A context is not meant to be mutated from several threads at once; every
/// state-changing operation takes `&mut self`.
pub struct KeyPairContext<B: RsaBackend = DefaultBackend> {
    key: Option<B::Key>,
    modulus: Option<ModulusLength>,
    state: KeyState,
    exports: usize,
    _backend: PhantomData<fn() -> B>,
}

impl<B: RsaBackend> KeyPairContext<B> {
    /// A context holding no key yet.
    pub fn new() -> Self {
        Self {
            key: None,
            modulus: None,
            state: KeyState::Empty,
            exports: 0,
            _backend: PhantomData,
        }
    }

    pub(crate) fn from_key(key: B::Key, modulus: ModulusLength, state: KeyState) -> Self {
        Self {
            key: Some(key),
            modulus: Some(modulus),
            state,
            exports: 0,
            _backend: PhantomData,
        }
    }

    /// Generates a fresh key pair of `bits` bits.
    pub fn generate(bits: u32) -> Result<Self> {
        let modulus = validate_and_normalize(bits)?;
        generator::generate(modulus)
    }

    /// Rebuilds a key from container bytes.
    pub fn import(bytes: &[u8], expect_private: bool) -> Result<Self> {
        importer::import(bytes, expect_private)
    }

    /// Fills an empty context with a freshly generated key.
    pub fn generate_in_place(&mut self, bits: u32) -> Result<()> {
        self.ensure_empty("generate into")?;
        *self = Self::generate(bits)?;
        Ok(())
    }

    /// Fills an empty context with an imported key.
    pub fn import_in_place(&mut self, bytes: &[u8], expect_private: bool) -> Result<()> {
        self.ensure_empty("import into")?;
        *self = Self::import(bytes, expect_private)?;
        Ok(())
    }

    pub fn state(&self) -> KeyState {
        self.state
    }

    pub fn is_released(&self) -> bool {
        self.state == KeyState::Released
    }

    /// How many containers have been written from this context.
    pub fn export_count(&self) -> usize {
        self.exports
    }

    pub fn modulus_length(&self) -> Result<ModulusLength> {
        self.live()?;
        self.modulus.ok_or(Error::InvalidState {
            state: self.state,
            operation: "inspect",
        })
    }

    pub fn modulus_bits(&self) -> Result<usize> {
        Ok(B::modulus_bits(self.key()?))
    }

    pub fn has_private(&self) -> Result<bool> {
        Ok(B::has_private(self.key()?))
    }

    /// The public exponent, big-endian without leading zeros.
    pub fn public_exponent(&self) -> Result<Vec<u8>> {
        let fields = self.fields()?;
        Ok(strip_leading_zeros(&fields.public_exponent).to_vec())
    }

    /// A snapshot of the key components. The snapshot wipes itself on drop.
    pub fn fields(&self) -> Result<RsaKeyFields> {
        B::key_fields(self.key()?).map_err(Error::Backend)
    }

    /// Exact length of the container [`export`](Self::export) would write.
    pub fn exported_len(&self, include_private: bool) -> Result<usize> {
        let key = self.key()?;
        if include_private && !B::has_private(key) {
            return Err(Error::PrivateMaterialUnavailable);
        }
        let fields = B::key_fields(key).map_err(Error::Backend)?;
        let exponent_len = strip_leading_zeros(&fields.public_exponent).len();
        Ok(encoded_len(
            self.modulus_length()?,
            exponent_len,
            KeyKind::from_private(include_private),
        ))
    }

    /// Writes the key into `buffer`. See [`exporter::export`].
    pub fn export(&mut self, include_private: bool, buffer: &mut [u8]) -> Result<usize> {
        exporter::export(self, include_private, buffer)
    }

    /// Exports into a freshly allocated container.
    pub fn export_to_vec(&mut self, include_private: bool) -> Result<KeyContainer> {
        exporter::export_to_vec(self, include_private)
    }

    /// Drops the backend key and moves to `Released`.
    pub fn release(&mut self) -> Result<()> {
        self.live()?;
        self.discard();
        tracing::debug!(backend = B::NAME, "released RSA key context");
        Ok(())
    }

    pub(crate) fn key(&self) -> Result<&B::Key> {
        self.live()?;
        self.key.as_ref().ok_or(Error::InvalidState {
            state: self.state,
            operation: "use",
        })
    }

    pub(crate) fn mark_exported(&mut self) {
        self.state = KeyState::Exported;
        self.exports += 1;
    }

    fn live(&self) -> Result<()> {
        if self.is_released() {
            tracing::warn!(backend = B::NAME, "operation on a released key context");
            return Err(Error::UseAfterRelease);
        }
        Ok(())
    }

    fn ensure_empty(&self, operation: &'static str) -> Result<()> {
        self.live()?;
        if self.state != KeyState::Empty {
            return Err(Error::InvalidState {
                state: self.state,
                operation,
            });
        }
        Ok(())
    }

    fn discard(&mut self) {
        // The backend key clears its private components when dropped.
        self.key = None;
        self.modulus = None;
        self.state = KeyState::Released;
    }
}

impl<B: RsaBackend> Default for KeyPairContext<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RsaBackend> Drop for KeyPairContext<B> {
    fn drop(&mut self) {
        if self.key.is_some() {
            self.discard();
        }
    }
}

impl<B: RsaBackend> fmt::Debug for KeyPairContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairContext")
            .field("backend", &B::NAME)
            .field("state", &self.state)
            .field("modulus_bits", &self.modulus.map(ModulusLength::bits))
            .field("private", &self.key.as_ref().map(B::has_private))
            .field("exports", &self.exports)
            .finish()
    }
}
