//! The crypto facade: twelve operations behind one entry point, each
//! resolving its required key by matching on [`KeyKind`] rather than
//! querying a registry.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use getrandom::getrandom;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::kdf::SecurityLevel;
use crate::kem::{HybridX25519MlKem768Provider, KemProvider, PublicKey as KemPublicKey, SecretKey as KemSecretKey};
use crate::keys::{KeyHandle, KeyKind, SensitiveBytes};
use crate::mac::{self, MAC_BYTES};
use crate::request::CryptoRequest;
use crate::signature;
use crate::wire;

const SEAL_CONTEXT: &[u8] = b"vaultcrypt|seal|v1";
const SYMMETRIC_KEY_BYTES: usize = 32;

/// The concrete, stateless implementation of the crypto facade. Every
/// method takes whatever key handles it needs directly; there is no
/// process-wide key registry.
#[derive(Default)]
pub struct CryptoFacade;

impl CryptoFacade {
    pub fn new() -> Self {
        Self
    }

    // -- generation ----------------------------------------------------

    /// Generate a random (or, if `password` is given, Argon2id-derived)
    /// AES-256-GCM key.
    pub fn generate_symmetric_encryption_key(
        &self,
        password: Option<(&[u8], &[u8])>,
        security_level: SecurityLevel,
    ) -> Result<KeyHandle, CryptoError> {
        let raw = derive_or_random(password, security_level, SYMMETRIC_KEY_BYTES)?;
        Ok(KeyHandle::new(KeyKind::SymmetricEncryptionKey, raw))
    }

    /// Generate a random (or Argon2id-derived) keyed-BLAKE2b-512
    /// authentication key.
    pub fn generate_symmetric_auth_key(
        &self,
        password: Option<(&[u8], &[u8])>,
        security_level: SecurityLevel,
    ) -> Result<KeyHandle, CryptoError> {
        let raw = derive_or_random(password, security_level, SYMMETRIC_KEY_BYTES)?;
        Ok(KeyHandle::new(KeyKind::SymmetricAuthenticationKey, raw))
    }

    /// Generate an Ed25519 signature keypair. When `password` is given,
    /// the signing seed is derived via Argon2id instead of drawn from the
    /// system RNG — the same (password, salt) pair always yields the same
    /// keypair.
    pub fn generate_signature_keypair(
        &self,
        password: Option<(&[u8], &[u8])>,
        security_level: SecurityLevel,
    ) -> Result<(KeyHandle, KeyHandle), CryptoError> {
        let (public, secret) = match password {
            Some((pw, salt)) => {
                let seed = crate::kdf::derive_from_password(pw, salt, security_level)
                    .map_err(CryptoError::from)?;
                signature::keypair_from_seed(&seed)
            }
            None => signature::generate_keypair(),
        };
        Ok((
            KeyHandle::new(KeyKind::AsymmetricSignaturePublicKey, public.to_vec()),
            KeyHandle::new(KeyKind::AsymmetricSignatureSecretKey, secret.to_vec()),
        ))
    }

    /// Generate a hybrid X25519 + ML-KEM-768 sealed-box keypair.
    pub fn generate_asymmetric_encryption_keypair(&self) -> (KeyHandle, KeyHandle) {
        let (pk, sk) = HybridX25519MlKem768Provider::keygen();
        (
            KeyHandle::new(KeyKind::AsymmetricEncryptionPublicKey, pk.to_bytes().to_vec()),
            KeyHandle::new(KeyKind::AsymmetricEncryptionSecretKey, sk.to_bytes().to_vec()),
        )
    }

    /// Generate a combined X25519 + ML-KEM-768 keypair as a single handle
    /// tagged [`KeyKind::AsymmetricEncryptionKeypair`], raw bytes laid out
    /// `public ‖ secret`. Operations that need one half split it out via
    /// [`resolve_key`].
    pub fn generate_asymmetric_encryption_combined_keypair(&self) -> KeyHandle {
        let (pk, sk) = HybridX25519MlKem768Provider::keygen();
        let mut raw = Vec::with_capacity(wire::KEM_PUBLIC_KEY_BYTES + wire::KEM_SECRET_KEY_BYTES);
        raw.extend_from_slice(&pk.to_bytes());
        raw.extend_from_slice(&sk.to_bytes());
        KeyHandle::new(KeyKind::AsymmetricEncryptionKeypair, raw)
    }

    /// Generate a combined Ed25519 keypair as a single handle tagged
    /// [`KeyKind::AsymmetricSignatureKeypair`], raw bytes laid out
    /// `public ‖ secret`.
    pub fn generate_signature_combined_keypair(
        &self,
        password: Option<(&[u8], &[u8])>,
        security_level: SecurityLevel,
    ) -> Result<KeyHandle, CryptoError> {
        let (public, secret) = match password {
            Some((pw, salt)) => {
                let seed = crate::kdf::derive_from_password(pw, salt, security_level)
                    .map_err(CryptoError::from)?;
                signature::keypair_from_seed(&seed)
            }
            None => signature::generate_keypair(),
        };
        let mut raw = Vec::with_capacity(
            signature::SIGNATURE_PUBLIC_KEY_BYTES + signature::SIGNATURE_SECRET_KEY_BYTES,
        );
        raw.extend_from_slice(&public);
        raw.extend_from_slice(&secret);
        Ok(KeyHandle::new(KeyKind::AsymmetricSignatureKeypair, raw))
    }

    // -- symmetric encryption -------------------------------------------

    /// AES-256-GCM encrypt. Wire shape: `nonce[12] || ciphertext‖tag`.
    pub fn encrypt_message(
        &self,
        key: &KeyHandle,
        plaintext: &[u8],
        additional_data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let key = resolve_key(key, KeyKind::SymmetricEncryptionKey)?;
        let aes_key: [u8; 32] = key.raw().try_into().map_err(|_| CryptoError::Encoding)?;
        let nonce = crate::aead::nonce().map_err(CryptoError::from)?;
        let ct = crate::aead::aead_seal(&aes_key, &nonce, plaintext, additional_data)
            .map_err(CryptoError::from)?;
        let mut out = Vec::with_capacity(12 + ct.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ct);
        Ok(out)
    }

    pub fn decrypt_message(
        &self,
        key: &KeyHandle,
        ciphertext: &[u8],
        additional_data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let key = resolve_key(key, KeyKind::SymmetricEncryptionKey)?;
        if ciphertext.len() < 12 {
            return Err(CryptoError::Decryption);
        }
        let aes_key: [u8; 32] = key.raw().try_into().map_err(|_| CryptoError::Decryption)?;
        let (nonce_bytes, ct) = ciphertext.split_at(12);
        let nonce: [u8; 12] = nonce_bytes.try_into().map_err(|_| CryptoError::Decryption)?;
        crate::aead::aead_open(&aes_key, &nonce, ct, additional_data).map_err(CryptoError::from)
    }

    /// Fluent-request form of [`Self::encrypt_message`]: takes its key and
    /// additional data from `request.options` rather than as positional
    /// arguments, for callers already building a [`CryptoRequest`].
    pub fn encrypt(&self, request: &CryptoRequest) -> Result<Vec<u8>, CryptoError> {
        let key = request
            .options
            .symmetric_key
            .as_ref()
            .ok_or(CryptoError::MissingRequiredKey)?;
        let plaintext = request.message_bytes()?;
        let aad = request.options.additional_data.as_deref().unwrap_or(&[]);
        self.encrypt_message(key, plaintext, aad)
    }

    /// Fluent-request form of [`Self::decrypt_message`].
    pub fn decrypt(&self, request: &CryptoRequest) -> Result<Vec<u8>, CryptoError> {
        let key = request
            .options
            .symmetric_key
            .as_ref()
            .ok_or(CryptoError::MissingRequiredKey)?;
        let ciphertext = request.message_bytes()?;
        let aad = request.options.additional_data.as_deref().unwrap_or(&[]);
        self.decrypt_message(key, ciphertext, aad)
    }

    // -- authentication / checksum ---------------------------------------

    /// Keyed BLAKE2b-512 MAC over `message`.
    pub fn authenticate(&self, key: &KeyHandle, message: &[u8]) -> Result<[u8; MAC_BYTES], CryptoError> {
        let key = resolve_key(key, KeyKind::SymmetricAuthenticationKey)?;
        mac::mac(key.raw(), message).map_err(CryptoError::from)
    }

    pub fn authenticate_verify(&self, key: &KeyHandle, message: &[u8], tag: &[u8; MAC_BYTES]) -> bool {
        let key = match resolve_key(key, KeyKind::SymmetricAuthenticationKey) {
            Ok(key) => key,
            Err(_) => return false,
        };
        mac::verify(key.raw(), message, tag)
    }

    /// Same primitive as `authenticate`, named separately because the
    /// keyring integrity engine computes it over its own serialized state
    /// rather than caller-supplied message bytes.
    pub fn checksum(&self, key: &KeyHandle, data: &[u8]) -> Result<[u8; MAC_BYTES], CryptoError> {
        self.authenticate(key, data)
    }

    // -- signatures -------------------------------------------------------

    pub fn sign(&self, key: &KeyHandle, message: &[u8]) -> Result<[u8; signature::SIGNATURE_BYTES], CryptoError> {
        let key = resolve_key(key, KeyKind::AsymmetricSignatureSecretKey)?;
        signature::sign(key.raw(), message)
    }

    pub fn verify(&self, key: &KeyHandle, message: &[u8], sig: &[u8]) -> bool {
        let key = match resolve_key(key, KeyKind::AsymmetricSignaturePublicKey) {
            Ok(key) => key,
            Err(_) => return false,
        };
        signature::verify(key.raw(), message, sig)
    }

    // -- sealed box (hybrid PQC) ------------------------------------------

    /// Seal `plaintext` to a recipient's public key.
    pub fn seal(&self, public_key: &KeyHandle, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let public_key = resolve_key(public_key, KeyKind::AsymmetricEncryptionPublicKey)?;
        let pk = KemPublicKey::from_bytes(public_key.raw()).map_err(CryptoError::from)?;

        let (ss_raw, kem_ct) =
            HybridX25519MlKem768Provider::encapsulate(&pk).map_err(CryptoError::from)?;
        let shared_secret = Zeroizing::new(ss_raw);
        let ct_hash = crate::kdf::ct_hash(&kem_ct);
        let aes_key = Zeroizing::new(
            crate::kdf::derive_key(&shared_secret, &ct_hash, SEAL_CONTEXT).map_err(CryptoError::from)?,
        );
        let nonce = crate::aead::nonce().map_err(CryptoError::from)?;
        let aead_ct =
            crate::aead::aead_seal(&aes_key, &nonce, plaintext, &[]).map_err(CryptoError::from)?;
        wire::encode_wire(&kem_ct, &nonce, &aead_ct).map_err(CryptoError::from)
    }

    /// Unseal a ciphertext produced by [`CryptoFacade::seal`].
    pub fn unseal(&self, secret_key: &KeyHandle, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let secret_key = resolve_key(secret_key, KeyKind::AsymmetricEncryptionSecretKey)?;
        let sk = KemSecretKey::from_bytes(secret_key.raw()).map_err(CryptoError::from)?;

        let parts = wire::decode_wire(ciphertext).map_err(CryptoError::from)?;
        let ss_raw =
            HybridX25519MlKem768Provider::decapsulate(&sk, parts.kem_ciphertext).map_err(CryptoError::from)?;
        let shared_secret = Zeroizing::new(ss_raw);
        let ct_hash = crate::kdf::ct_hash(parts.kem_ciphertext);
        let aes_key = Zeroizing::new(
            crate::kdf::derive_key(&shared_secret, &ct_hash, SEAL_CONTEXT)
                .map_err(|_| CryptoError::Decryption)?,
        );
        crate::aead::aead_open(&aes_key, parts.nonce, parts.aead_ciphertext, &[]).map_err(CryptoError::from)
    }

    // -- import / export ---------------------------------------------------

    pub fn export_key(&self, key: &KeyHandle) -> alloc::string::String {
        key.export_hex()
    }

    pub fn import_key(&self, blob: &str) -> Result<KeyHandle, CryptoError> {
        KeyHandle::import_hex(blob)
    }
}

/// Resolve `key` to the kind an operation needs: returned unchanged if it
/// already matches, or split out of a combined keypair handle if `key` is
/// tagged with that keypair's parent [`KeyKind`] (see
/// [`KeyKind::expand_children`]). Any other mismatch is an error.
fn resolve_key(key: &KeyHandle, expected: KeyKind) -> Result<KeyHandle, CryptoError> {
    if key.kind() == expected {
        return Ok(key.clone());
    }
    if key.kind().is_keypair() && key.kind().expand_children().contains(&expected) {
        return split_combined_keypair(key, expected);
    }
    Err(CryptoError::WrongKeyType {
        expected: alloc::string::String::from(expected.as_str()),
        found: alloc::string::String::from(key.kind().as_str()),
    })
}

/// Split a combined keypair handle (raw bytes laid out `public ‖ secret`,
/// as produced by [`CryptoFacade::generate_asymmetric_encryption_combined_keypair`]
/// / [`CryptoFacade::generate_signature_combined_keypair`]) into the
/// requested half.
fn split_combined_keypair(key: &KeyHandle, want: KeyKind) -> Result<KeyHandle, CryptoError> {
    let (public_len, secret_len, public_kind, secret_kind) = match key.kind() {
        KeyKind::AsymmetricEncryptionKeypair => (
            wire::KEM_PUBLIC_KEY_BYTES,
            wire::KEM_SECRET_KEY_BYTES,
            KeyKind::AsymmetricEncryptionPublicKey,
            KeyKind::AsymmetricEncryptionSecretKey,
        ),
        KeyKind::AsymmetricSignatureKeypair => (
            signature::SIGNATURE_PUBLIC_KEY_BYTES,
            signature::SIGNATURE_SECRET_KEY_BYTES,
            KeyKind::AsymmetricSignaturePublicKey,
            KeyKind::AsymmetricSignatureSecretKey,
        ),
        _ => {
            return Err(CryptoError::WrongKeyType {
                expected: alloc::string::String::from(want.as_str()),
                found: alloc::string::String::from(key.kind().as_str()),
            })
        }
    };

    let raw = key.raw();
    if raw.len() != public_len + secret_len {
        return Err(CryptoError::Encoding);
    }
    let (public_bytes, secret_bytes) = raw.split_at(public_len);
    debug_assert_eq!(secret_bytes.len(), secret_len);

    if want == public_kind {
        Ok(KeyHandle::new(public_kind, public_bytes))
    } else if want == secret_kind {
        Ok(KeyHandle::new(secret_kind, secret_bytes))
    } else {
        Err(CryptoError::WrongKeyType {
            expected: alloc::string::String::from(want.as_str()),
            found: alloc::string::String::from(key.kind().as_str()),
        })
    }
}

fn derive_or_random(
    password: Option<(&[u8], &[u8])>,
    security_level: SecurityLevel,
    len: usize,
) -> Result<SensitiveBytes, CryptoError> {
    match password {
        Some((pw, salt)) => {
            let derived =
                crate::kdf::derive_from_password(pw, salt, security_level).map_err(CryptoError::from)?;
            Ok(SensitiveBytes::new(derived[..len].to_vec()))
        }
        None => {
            let mut buf = vec![0u8; len];
            getrandom(&mut buf).map_err(|_| CryptoError::BackendFailure)?;
            Ok(SensitiveBytes::new(buf))
        }
    }
}
