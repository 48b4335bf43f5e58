//! proptest-based round-trip properties for the AEAD and MAC primitives,
//! plus a coarse, CI-ignored constant-time-equality timing check.

use proptest::collection::vec;
use proptest::prelude::*;
use vaultcrypt::{CryptoFacade, SecurityLevel};

proptest! {
    #[test]
    fn symmetric_encrypt_decrypt_round_trips_for_any_plaintext_and_aad(
        plaintext in vec(any::<u8>(), 0..=512),
        aad in vec(any::<u8>(), 0..=64),
    ) {
        let facade = CryptoFacade::new();
        let key = facade
            .generate_symmetric_encryption_key(None, SecurityLevel::Interactive)
            .unwrap();

        let ct = facade.encrypt_message(&key, &plaintext, &aad).unwrap();
        let pt = facade.decrypt_message(&key, &ct, &aad).unwrap();
        prop_assert_eq!(pt, plaintext);
    }

    #[test]
    fn symmetric_decrypt_fails_whenever_aad_is_perturbed(
        plaintext in vec(any::<u8>(), 0..=256),
        aad in vec(any::<u8>(), 1..=32),
        perturb_index in 0usize..32,
    ) {
        let facade = CryptoFacade::new();
        let key = facade
            .generate_symmetric_encryption_key(None, SecurityLevel::Interactive)
            .unwrap();

        let ct = facade.encrypt_message(&key, &plaintext, &aad).unwrap();

        let mut bad_aad = aad.clone();
        let idx = perturb_index % bad_aad.len();
        bad_aad[idx] ^= 0x01;

        prop_assert!(facade.decrypt_message(&key, &ct, &bad_aad).is_err());
    }

    #[test]
    fn authenticate_verify_round_trips_for_any_message(
        message in vec(any::<u8>(), 0..=512),
    ) {
        let facade = CryptoFacade::new();
        let key = facade
            .generate_symmetric_auth_key(None, SecurityLevel::Interactive)
            .unwrap();

        let tag = facade.authenticate(&key, &message).unwrap();
        prop_assert!(facade.authenticate_verify(&key, &message, &tag));
    }

    #[test]
    fn authenticate_verify_rejects_any_single_bit_flip_in_the_message(
        message in vec(any::<u8>(), 1..=256),
        flip_index in 0usize..256,
    ) {
        let facade = CryptoFacade::new();
        let key = facade
            .generate_symmetric_auth_key(None, SecurityLevel::Interactive)
            .unwrap();

        let tag = facade.authenticate(&key, &message).unwrap();
        let mut tampered = message.clone();
        let idx = flip_index % tampered.len();
        tampered[idx] ^= 0x01;

        prop_assert!(!facade.authenticate_verify(&key, &tampered, &tag));
    }

    #[test]
    fn seal_unseal_round_trips_for_any_plaintext(
        plaintext in vec(any::<u8>(), 0..=1024),
    ) {
        let facade = CryptoFacade::new();
        let (pk, sk) = facade.generate_asymmetric_encryption_keypair();

        let ct = facade.seal(&pk, &plaintext).unwrap();
        let pt = facade.unseal(&sk, &ct).unwrap();
        prop_assert_eq!(pt, plaintext);
    }
}

/// Coarse statistical check that `authenticate_verify` doesn't leak a
/// timing signal proportional to how many leading bytes of the tag match —
/// a hand-rolled early-exit comparison would fail this, `subtle`'s
/// constant-time compare should not. Not a hard assertion: CI timing is far
/// too noisy for one, matching the teacher's own `benches/timing.rs` being
/// bench-only infrastructure rather than a pass/fail gate.
#[test]
#[ignore]
fn authenticate_verify_timing_does_not_scale_with_match_prefix_length() {
    use std::time::Instant;

    let facade = CryptoFacade::new();
    let key = facade
        .generate_symmetric_auth_key(None, SecurityLevel::Interactive)
        .unwrap();
    let message = vec![0x42u8; 256];
    let real_tag = facade.authenticate(&key, &message).unwrap();

    let mut all_wrong = real_tag;
    for b in all_wrong.iter_mut() {
        *b ^= 0xff;
    }
    let mut prefix_right = all_wrong;
    prefix_right[..32].copy_from_slice(&facade.authenticate(&key, &message).unwrap()[..32]);

    let iters = 20_000;
    let time = |tag: &[u8]| {
        let start = Instant::now();
        for _ in 0..iters {
            let _ = facade.authenticate_verify(&key, &message, tag);
        }
        start.elapsed()
    };

    let t_all_wrong = time(&all_wrong);
    let t_prefix_right = time(&prefix_right);

    let ratio = t_prefix_right.as_secs_f64() / t_all_wrong.as_secs_f64().max(1e-9);
    assert!(
        ratio < 3.0 && ratio > 0.33,
        "suspiciously large timing skew between a wrong tag and a tag with a matching prefix: {ratio}"
    );
}
