//! Known-answer / wire-format tests for the hybrid sealed box.

use vaultcrypt::wire_format::{MIN_CIPHERTEXT_BYTES, PROTOCOL_VERSION};
use vaultcrypt::CryptoFacade;

#[test]
fn minimum_ciphertext_roundtrips_empty_plaintext() {
    let facade = CryptoFacade::new();
    let (pk, sk) = facade.generate_asymmetric_encryption_keypair();

    let ct = facade.seal(&pk, b"").unwrap();
    assert_eq!(ct.len(), MIN_CIPHERTEXT_BYTES);

    let pt = facade.unseal(&sk, &ct).unwrap();
    assert!(pt.is_empty());
}

#[test]
fn header_carries_the_current_protocol_version() {
    let facade = CryptoFacade::new();
    let (pk, _) = facade.generate_asymmetric_encryption_keypair();
    let ct = facade.seal(&pk, b"data").unwrap();
    assert_eq!(ct[0], PROTOCOL_VERSION);
}

#[test]
fn self_consistency_over_many_messages() {
    let facade = CryptoFacade::new();
    let (pk, sk) = facade.generate_asymmetric_encryption_keypair();

    for i in 0..10 {
        let plaintext = format!("msg {i}").into_bytes();
        let ct = facade.seal(&pk, &plaintext).unwrap();
        let pt = facade.unseal(&sk, &ct).unwrap();
        assert_eq!(pt, plaintext);
    }
}

#[test]
fn rejects_invalid_version_byte() {
    let facade = CryptoFacade::new();
    let (pk, sk) = facade.generate_asymmetric_encryption_keypair();

    let mut ct = facade.seal(&pk, b"test").unwrap();
    ct[0] = 0x99;
    assert!(facade.unseal(&sk, &ct).is_err());
}

#[test]
fn all_unseal_failures_produce_the_same_opaque_error() {
    let facade = CryptoFacade::new();
    let (pk, sk) = facade.generate_asymmetric_encryption_keypair();
    let ct = facade.seal(&pk, b"test").unwrap();

    let mut bad_suite = ct.clone();
    bad_suite[1] ^= 0x01;

    let errors = [
        facade.unseal(&sk, b"short").unwrap_err(),
        facade.unseal(&sk, &bad_suite).unwrap_err(),
    ];

    let first = format!("{}", errors[0]);
    for e in &errors {
        assert_eq!(format!("{e}"), first);
    }
}
