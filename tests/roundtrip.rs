//! Round-trip and tamper-detection tests across the whole facade surface.

use vaultcrypt::{CryptoFacade, KeyKind, SecurityLevel};

fn setup() -> (CryptoFacade, vaultcrypt::KeyHandle, vaultcrypt::KeyHandle) {
    let facade = CryptoFacade::new();
    let (pk, sk) = facade.generate_asymmetric_encryption_keypair();
    (facade, pk, sk)
}

#[test]
fn seal_unseal_roundtrip_basic() {
    let (facade, pk, sk) = setup();
    let plaintext = b"hello post-quantum world";

    let ct = facade.seal(&pk, plaintext).unwrap();
    let pt = facade.unseal(&sk, &ct).unwrap();
    assert_eq!(&pt, plaintext);
}

#[test]
fn seal_unseal_roundtrip_large_plaintext() {
    let (facade, pk, sk) = setup();
    let plaintext = vec![0xABu8; 65536];

    let ct = facade.seal(&pk, &plaintext).unwrap();
    let pt = facade.unseal(&sk, &ct).unwrap();
    assert_eq!(pt, plaintext);
}

#[test]
fn unseal_with_wrong_secret_key_fails() {
    let (facade, pk, _sk) = setup();
    let (_, _, sk2) = setup();
    let ct = facade.seal(&pk, b"data").unwrap();
    assert!(facade.unseal(&sk2, &ct).is_err());
}

#[test]
fn truncated_ciphertext_fails() {
    let (facade, pk, sk) = setup();
    let ct = facade.seal(&pk, b"data").unwrap();
    assert!(facade.unseal(&sk, &ct[..10]).is_err());
    assert!(facade.unseal(&sk, b"").is_err());
}

#[test]
fn tamper_aead_tail_fails() {
    let (facade, pk, sk) = setup();
    let mut ct = facade.seal(&pk, b"data").unwrap();
    let last = ct.len() - 1;
    ct[last] ^= 0x01;
    assert!(facade.unseal(&sk, &ct).is_err());
}

#[test]
fn key_serialization_roundtrip_via_hex_export() {
    let (facade, pk, sk) = setup();
    let plaintext = b"key serialization test";

    let pk_hex = facade.export_key(&pk);
    let sk_hex = facade.export_key(&sk);
    let pk2 = facade.import_key(&pk_hex).unwrap();
    let sk2 = facade.import_key(&sk_hex).unwrap();

    let ct = facade.seal(&pk2, plaintext).unwrap();
    let pt = facade.unseal(&sk2, &ct).unwrap();
    assert_eq!(&pt, plaintext);
}

#[test]
fn import_rejects_a_blob_with_a_foreign_adapter_tag() {
    let facade = CryptoFacade::new();
    let (pk, _) = facade.generate_asymmetric_encryption_keypair();
    let mut blob = facade.export_key(&pk);
    // Corrupt the hex-encoded adapter tag at the very front of the blob.
    blob.replace_range(0..2, "ff");
    assert!(facade.import_key(&blob).is_err());
}

#[test]
fn symmetric_encrypt_decrypt_roundtrip() {
    let facade = CryptoFacade::new();
    let key = facade
        .generate_symmetric_encryption_key(None, SecurityLevel::Interactive)
        .unwrap();

    let ct = facade.encrypt_message(&key, b"payload", b"context").unwrap();
    let pt = facade.decrypt_message(&key, &ct, b"context").unwrap();
    assert_eq!(pt, b"payload");
}

#[test]
fn symmetric_decrypt_with_wrong_additional_data_fails() {
    let facade = CryptoFacade::new();
    let key = facade
        .generate_symmetric_encryption_key(None, SecurityLevel::Interactive)
        .unwrap();

    let ct = facade.encrypt_message(&key, b"payload", b"good-aad").unwrap();
    assert!(facade.decrypt_message(&key, &ct, b"bad-aad").is_err());
}

#[test]
fn authenticate_and_verify_round_trip() {
    let facade = CryptoFacade::new();
    let key = facade
        .generate_symmetric_auth_key(None, SecurityLevel::Interactive)
        .unwrap();

    let tag = facade.authenticate(&key, b"message").unwrap();
    assert!(facade.authenticate_verify(&key, b"message", &tag));
    assert!(!facade.authenticate_verify(&key, b"tampered", &tag));
}

#[test]
fn sign_and_verify_round_trip() {
    let facade = CryptoFacade::new();
    let (public, secret) = facade
        .generate_signature_keypair(None, SecurityLevel::Interactive)
        .unwrap();

    let sig = facade.sign(&secret, b"message").unwrap();
    assert!(facade.verify(&public, b"message", &sig));
    assert!(!facade.verify(&public, b"tampered", &sig));
}

#[test]
fn wrong_key_kind_is_rejected_before_any_crypto_runs() {
    let facade = CryptoFacade::new();
    let (pk, _) = facade.generate_asymmetric_encryption_keypair();
    let err = facade.encrypt_message(&pk, b"data", b"").unwrap_err();
    assert!(matches!(
        err,
        vaultcrypt::CryptoError::WrongKeyType { .. }
    ));
}

#[test]
fn keypair_tag_expands_to_its_two_child_halves() {
    assert_eq!(
        KeyKind::AsymmetricEncryptionKeypair.expand_children(),
        &[
            KeyKind::AsymmetricEncryptionPublicKey,
            KeyKind::AsymmetricEncryptionSecretKey
        ]
    );
}

#[test]
fn seal_splits_a_combined_encryption_keypair_into_its_public_half() {
    let facade = CryptoFacade::new();
    let combined = facade.generate_asymmetric_encryption_combined_keypair();
    assert_eq!(combined.kind(), KeyKind::AsymmetricEncryptionKeypair);
    assert!(combined.kind().is_keypair());

    // `seal` only needs the public half; passing the combined handle
    // should transparently split it rather than erroring on kind mismatch.
    let ct = facade.seal(&combined, b"split me").unwrap();
    let pt = facade.unseal(&combined, &ct).unwrap();
    assert_eq!(pt, b"split me");
}

#[test]
fn sign_splits_a_combined_signature_keypair_into_its_secret_half() {
    let facade = CryptoFacade::new();
    let combined = facade
        .generate_signature_combined_keypair(None, SecurityLevel::Interactive)
        .unwrap();
    assert_eq!(combined.kind(), KeyKind::AsymmetricSignatureKeypair);

    let sig = facade.sign(&combined, b"message").unwrap();
    assert!(facade.verify(&combined, b"message", &sig));
    assert!(!facade.verify(&combined, b"tampered", &sig));
}

#[test]
fn resolve_key_rejects_a_keypair_whose_children_dont_include_the_wanted_kind() {
    let facade = CryptoFacade::new();
    let combined = facade
        .generate_signature_combined_keypair(None, SecurityLevel::Interactive)
        .unwrap();

    // A signature keypair has no symmetric-encryption child to split into.
    let err = facade.encrypt_message(&combined, b"data", b"").unwrap_err();
    assert!(matches!(err, vaultcrypt::CryptoError::WrongKeyType { .. }));
}
