//! Ed25519 sign/verify, and the password-derived signature keypair path.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;

use crate::error::CryptoError;

pub const SIGNATURE_PUBLIC_KEY_BYTES: usize = 32;
pub const SIGNATURE_SECRET_KEY_BYTES: usize = 32;
pub const SIGNATURE_BYTES: usize = 64;

/// Generate a fresh Ed25519 keypair. Returns (public, secret) raw bytes.
pub fn generate_keypair() -> ([u8; SIGNATURE_PUBLIC_KEY_BYTES], [u8; SIGNATURE_SECRET_KEY_BYTES]) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    (verifying_key.to_bytes(), signing_key.to_bytes())
}

/// Derive an Ed25519 keypair from a 32-byte seed (e.g. produced by Argon2id
/// from a password+salt). The seed is used directly as the signing key
/// scalar seed, matching `SigningKey::from_bytes`'s documented contract.
pub fn keypair_from_seed(
    seed: &[u8; 32],
) -> ([u8; SIGNATURE_PUBLIC_KEY_BYTES], [u8; SIGNATURE_SECRET_KEY_BYTES]) {
    let signing_key = SigningKey::from_bytes(seed);
    let verifying_key = signing_key.verifying_key();
    (verifying_key.to_bytes(), signing_key.to_bytes())
}

/// Sign `message` with a raw 32-byte Ed25519 secret key.
pub fn sign(secret_key: &[u8], message: &[u8]) -> Result<[u8; SIGNATURE_BYTES], CryptoError> {
    let bytes: [u8; 32] = secret_key.try_into().map_err(|_| CryptoError::Encoding)?;
    let signing_key = SigningKey::from_bytes(&bytes);
    Ok(signing_key.sign(message).to_bytes())
}

/// Verify a detached Ed25519 signature against a raw 32-byte public key.
/// Oracle-safe: any malformed input or mismatch returns `false`, never a
/// distinguishable error.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(pk_bytes): Result<[u8; 32], _> = public_key.try_into() else {
        return false;
    };
    let Ok(sig_bytes): Result<[u8; 64], _> = signature.try_into() else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pk_bytes) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    verifying_key.verify(message, &sig).is_ok()
}
