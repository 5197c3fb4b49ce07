//! Batch key generation on a rayon pool.

use rayon::prelude::*;

use crate::backend::RsaBackend;
use crate::common::config::KeyConfig;
use crate::common::errors::{Error, Result};
use crate::keys::context::KeyPairContext;
use crate::keys::generator;
use crate::keys::policy::validate_and_normalize;

/// Generates `count` independent key pairs in parallel, one worker per core.
pub fn generate_rsa_keys<B: RsaBackend>(bits: u32, count: usize) -> Result<Vec<KeyPairContext<B>>> {
    generate_rsa_keys_with(&KeyConfig::default(), bits, count)
}

/// Like [`generate_rsa_keys`], with the pool size taken from `config`.
///
/// The size is checked once before anything is scheduled. The first failure
/// is returned and every key generated so far is released.
pub fn generate_rsa_keys_with<B: RsaBackend>(
    config: &KeyConfig,
    bits: u32,
    count: usize,
) -> Result<Vec<KeyPairContext<B>>> {
    let modulus = validate_and_normalize(bits)?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_parallel_keygen)
        .build()
        .map_err(|e| Error::Configuration(format!("keygen thread pool: {e}")))?;

    tracing::debug!(
        backend = B::NAME,
        bits,
        count,
        threads = pool.current_num_threads(),
        "generating RSA keys in parallel"
    );

    pool.install(|| {
        (0..count)
            .into_par_iter()
            .map(|_| generator::generate::<B>(modulus))
            .collect()
    })
}
