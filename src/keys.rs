//! RSA key material: size policy, the key container and the key lifecycle.

pub mod container;
pub mod context;
pub mod exporter;
pub mod fields;
pub mod generator;
pub mod importer;
pub mod policy;

pub use self::container::{
    KeyContainer, KeyField, KeyKind, detect_key_kind, encoded_len, validate_key_container,
};
pub use self::context::{KeyPairContext, KeyState};
pub use self::fields::{PrivateKeyFields, RsaKeyFields};
pub use self::policy::{KeySize, ModulusLength, validate_and_normalize};
