//! Keyring Integrity Engine: the 176-byte checksum sidecar covering the
//! keyring's serialized state.
//!
//! Layout (fixed, not TLV): 88 bytes base64 of a keyed BLAKE2b-512
//! checksum, followed by 88 bytes base64 of a detached Ed25519 signature
//! over that checksum. 64 raw bytes base64-encode to 88 bytes (with
//! padding), so the two fields are fixed-width and concatenation alone is
//! enough to parse them back apart — no length prefix needed.

use vaultcrypt::CryptoFacade;

use crate::error::KeyringError;
use crate::master_key::MasterKeyBundle;

pub const CHECKSUM_FIELD_BYTES: usize = 88;
pub const SIGNATURE_FIELD_BYTES: usize = 88;
pub const SIDECAR_BYTES: usize = CHECKSUM_FIELD_BYTES + SIGNATURE_FIELD_BYTES;

/// The 176-byte sidecar: a keyed-BLAKE2b-512 checksum of the keyring's
/// canonical JSON, signed with the master key bundle's Ed25519 key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumSidecar {
    checksum_b64: [u8; CHECKSUM_FIELD_BYTES],
    signature_b64: [u8; SIGNATURE_FIELD_BYTES],
}

impl ChecksumSidecar {
    /// Compute and sign a sidecar over `keyring_bytes` (the keyring's
    /// exact canonical JSON bytes — the same bytes that will be written
    /// to the `Keyring` connection).
    pub fn generate(
        facade: &CryptoFacade,
        bundle: &MasterKeyBundle,
        keyring_bytes: &[u8],
    ) -> Result<Self, KeyringError> {
        let checksum = facade.checksum(bundle.checksum_key(), keyring_bytes)?;
        let checksum_b64 = encode_field(&checksum)?;

        let signature = facade.sign(bundle.signature_secret_key(), &checksum)?;
        let signature_b64 = encode_field(&signature)?;

        Ok(Self {
            checksum_b64,
            signature_b64,
        })
    }

    /// Verify this sidecar against `keyring_bytes`, using the bundle's
    /// checksum key and signature public key. Returns the specific
    /// mismatch kind rather than a single opaque failure, since the
    /// keyring integrity engine (unlike secret decryption) is meant to
    /// tell operators which half tampering landed on.
    pub fn verify(
        &self,
        facade: &CryptoFacade,
        bundle: &MasterKeyBundle,
        keyring_bytes: &[u8],
    ) -> Result<(), KeyringError> {
        let checksum_bytes = decode_field(&self.checksum_b64)?;
        let checksum_arr: [u8; vaultcrypt::MAC_BYTES] = checksum_bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyringError::MalformedSidecar)?;

        if !facade.authenticate_verify(bundle.checksum_key(), keyring_bytes, &checksum_arr) {
            return Err(KeyringError::ChecksumMismatch);
        }

        let signature_bytes = decode_field(&self.signature_b64)?;
        if !facade.verify(bundle.signature_public_key(), &checksum_arr, &signature_bytes) {
            return Err(KeyringError::BadSignature);
        }

        Ok(())
    }

    /// Serialize to the fixed 176-byte wire form.
    pub fn serialize(&self) -> [u8; SIDECAR_BYTES] {
        let mut out = [0u8; SIDECAR_BYTES];
        out[..CHECKSUM_FIELD_BYTES].copy_from_slice(&self.checksum_b64);
        out[CHECKSUM_FIELD_BYTES..].copy_from_slice(&self.signature_b64);
        out
    }

    /// Parse the fixed 176-byte wire form.
    pub fn parse(bytes: &[u8]) -> Result<Self, KeyringError> {
        if bytes.len() != SIDECAR_BYTES {
            return Err(KeyringError::MalformedSidecar);
        }
        let mut checksum_b64 = [0u8; CHECKSUM_FIELD_BYTES];
        checksum_b64.copy_from_slice(&bytes[..CHECKSUM_FIELD_BYTES]);
        let mut signature_b64 = [0u8; SIGNATURE_FIELD_BYTES];
        signature_b64.copy_from_slice(&bytes[CHECKSUM_FIELD_BYTES..]);
        Ok(Self {
            checksum_b64,
            signature_b64,
        })
    }
}

fn encode_field<const N: usize>(bytes: &[u8; N]) -> Result<[u8; 88], KeyringError> {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    let mut out = [0u8; 88];
    let b = encoded.as_bytes();
    if b.len() != 88 {
        return Err(KeyringError::MalformedSidecar);
    }
    out.copy_from_slice(b);
    Ok(out)
}

fn decode_field(field: &[u8; 88]) -> Result<Vec<u8>, KeyringError> {
    use base64::Engine;
    let text = std::str::from_utf8(field).map_err(|_| KeyringError::MalformedSidecar)?;
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map_err(|_| KeyringError::MalformedSidecar)
}
