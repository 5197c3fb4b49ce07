//! Worker-offloaded key generation.

mod common;

use common::init_tracing;
use seal_rsa::engines::{
    generate_rsa_key_async, generate_rsa_keys, generate_rsa_keys_with, import_rsa_key_async,
};
use seal_rsa::{DefaultBackend, Error, KeyConfig, KeyPairContext, KeyState};

#[tokio::test]
async fn test_async_generation() {
    init_tracing();

    let mut ctx: KeyPairContext = generate_rsa_key_async(1024).await.unwrap();
    assert_eq!(ctx.state(), KeyState::Generated);
    assert_eq!(ctx.modulus_bits().unwrap(), 1024);

    let container = ctx.export_to_vec(true).unwrap();
    let imported: KeyPairContext =
        import_rsa_key_async(container.as_bytes().to_vec(), true).await.unwrap();
    assert_eq!(imported.fields().unwrap(), ctx.fields().unwrap());
}

#[tokio::test]
async fn test_async_generation_checks_size_first() {
    init_tracing();

    let result = generate_rsa_key_async::<DefaultBackend>(1234).await;
    assert!(matches!(result, Err(Error::UnsupportedKeySize(1234))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_generation_concurrently() {
    init_tracing();

    let (a, b) = tokio::join!(
        generate_rsa_key_async::<DefaultBackend>(1024),
        generate_rsa_key_async::<DefaultBackend>(1024)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.fields().unwrap().modulus, b.fields().unwrap().modulus);
}

#[test]
fn test_parallel_generation() {
    init_tracing();

    let keys: Vec<KeyPairContext> = generate_rsa_keys(1024, 4).unwrap();
    assert_eq!(keys.len(), 4);

    let mut moduli: Vec<Vec<u8>> = keys
        .iter()
        .map(|ctx| ctx.fields().unwrap().modulus.clone())
        .collect();
    moduli.sort();
    moduli.dedup();
    assert_eq!(moduli.len(), 4);
}

#[test]
fn test_parallel_generation_with_config() {
    init_tracing();

    let config = KeyConfig {
        rsa_key_bits: 1024,
        max_parallel_keygen: 2,
    };
    let keys: Vec<KeyPairContext> =
        generate_rsa_keys_with(&config, config.rsa_key_bits, 3).unwrap();
    assert!(keys.iter().all(|ctx| ctx.modulus_bits().unwrap() == 1024));

    let none: Vec<KeyPairContext> = generate_rsa_keys_with(&config, 1024, 0).unwrap();
    assert!(none.is_empty());

    assert!(matches!(
        generate_rsa_keys::<DefaultBackend>(999, 8),
        Err(Error::UnsupportedKeySize(999))
    ));
}
