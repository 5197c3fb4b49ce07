//! Signing and encryption contexts built on a [`KeyPairContext`](crate::keys::KeyPairContext).

pub mod cipher;
pub mod sign;

pub use self::cipher::CipherContext;
pub use self::sign::SignContext;
