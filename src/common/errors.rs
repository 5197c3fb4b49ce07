//! Error types shared by every part of the crate.

use crate::keys::container::{KeyField, KeyKind};
use crate::keys::context::KeyState;
use thiserror::Error;

/// A failure reported by a backend engine.
///
/// The backend's own diagnostic (error code and message) is kept so that a
/// wrapped failure can still be traced back to the engine that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{backend} backend error: {message}")]
pub struct BackendError {
    /// Name of the backend that failed.
    pub backend: &'static str,
    /// Native error code, when the backend exposes one.
    pub code: Option<u64>,
    /// Human readable backend diagnostic.
    pub message: String,
}

impl BackendError {
    pub fn new(backend: &'static str, message: impl Into<String>) -> Self {
        Self {
            backend,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: u64) -> Self {
        self.code = Some(code);
        self
    }
}

/// The main error type for the `seal-rsa` crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported RSA key size: {0} bits")]
    UnsupportedKeySize(u32),

    #[error("RSA key generation failed")]
    KeyGenerationFailed(#[source] BackendError),

    #[error("malformed key container: {0}")]
    MalformedKeyContainer(&'static str),

    #[error("key type mismatch: expected {expected}, found {found}")]
    KeyTypeMismatch { expected: KeyKind, found: KeyKind },

    #[error("invalid key field `{field}`: {reason}")]
    InvalidKeyField {
        field: KeyField,
        reason: &'static str,
    },

    #[error("backend rejected key")]
    BackendRejectedKey(#[source] BackendError),

    #[error("private key material is not available")]
    PrivateMaterialUnavailable,

    #[error("buffer too small: {required} bytes required, {provided} provided")]
    BufferTooSmall { required: usize, provided: usize },

    #[error("key context has been released")]
    UseAfterRelease,

    #[error("cannot {operation} a key context in state {state}")]
    InvalidState {
        state: KeyState,
        operation: &'static str,
    },

    #[error("backend operation failed")]
    Backend(#[source] BackendError),

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("serialization error (JSON)")]
    Json(#[from] serde_json::Error),

    #[error("decoding from Base64 failed")]
    Base64(#[from] base64::DecodeError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[cfg(feature = "async-engine")]
    #[error("key generation worker failed")]
    Worker(#[from] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn invalid_field(field: KeyField, reason: &'static str) -> Self {
        Error::InvalidKeyField { field, reason }
    }

    /// The exact length a caller has to provide after a `BufferTooSmall`.
    pub fn required_len(&self) -> Option<usize> {
        match self {
            Error::BufferTooSmall { required, .. } => Some(*required),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
