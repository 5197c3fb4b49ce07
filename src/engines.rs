//! Running key generation off the caller's thread.

#[cfg(feature = "async-engine")]
mod async_;
#[cfg(feature = "parallel")]
mod parallel;

#[cfg(feature = "async-engine")]
pub use async_::*;
#[cfg(feature = "parallel")]
pub use parallel::*;
