//! KDF (v1 structured)
//!
//! info = PROTOCOL_ID || b"|aes|" || ct_hash || context
//! key  = HKDF-SHA256(shared_secret, salt=None, info=info, len=32)

extern crate alloc;
use alloc::vec::Vec;

use hkdf::Hkdf;
use sha2::Sha256;
use sha3::{Digest, Sha3_256};

use crate::error::EncodingError;
use crate::wire::PROTOCOL_ID;

pub fn ct_hash(kem_ct: &[u8]) -> [u8; 32] {
    let h = Sha3_256::digest(kem_ct);
    let mut out = [0u8; 32];
    out.copy_from_slice(&h);
    out
}

pub fn derive_key(shared_secret: &[u8], ct_hash: &[u8; 32], context: &[u8]) -> Result<[u8; 32], EncodingError> {
    let mut info = Vec::with_capacity(PROTOCOL_ID.len() + 5 + 32 + context.len());
    info.extend_from_slice(PROTOCOL_ID);
    info.extend_from_slice(b"|aes|");
    info.extend_from_slice(ct_hash);
    info.extend_from_slice(context);

    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut out = [0u8; 32];
    hk.expand(&info, &mut out).map_err(|_| EncodingError)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Password-based key derivation (Argon2id)
// ---------------------------------------------------------------------------

/// How much work Argon2id spends deriving a key from a password. Named
/// after libsodium's `crypto_pwhash` tiers, since that's the convention the
/// operations this backs (`generate_symmetric_encryption_key`,
/// `generate_symmetric_auth_key`, `generate_signature_keypair`) borrow for
/// their own `security_level` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    Interactive,
    Moderate,
    Sensitive,
}

impl SecurityLevel {
    fn params(self) -> argon2::Params {
        let (mem_kib, iterations, parallelism) = match self {
            // m_cost (KiB), t_cost, p_cost
            Self::Interactive => (19_456, 2, 1),
            Self::Moderate => (65_536, 3, 1),
            Self::Sensitive => (262_144, 4, 1),
        };
        argon2::Params::new(mem_kib, iterations, parallelism, Some(32))
            .expect("static argon2 params are valid")
    }
}

/// Derive a 32-byte key from `password` and `salt` using Argon2id. The
/// result is suitable either as a raw AES-256/BLAKE2b key or as an Ed25519
/// seed (see [`crate::signature::keypair_from_seed`]).
pub fn derive_from_password(
    password: &[u8],
    salt: &[u8],
    level: SecurityLevel,
) -> Result<[u8; 32], EncodingError> {
    use argon2::{Algorithm, Argon2, Version};

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, level.params());
    let mut out = [0u8; 32];
    argon2
        .hash_password_into(password, salt, &mut out)
        .map_err(|_| EncodingError)?;
    Ok(out)
}
