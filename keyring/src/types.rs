//! Core data model: vault/secret-key naming, the keyring's own on-disk
//! shape, and the per-secret envelope record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Name of a vault (a namespace of secrets sharing one DEK-wrapping
/// lineage). Not a path — never contains `/`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VaultName(String);

impl VaultName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VaultName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a secret within a vault.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SecretKeyName(String);

impl SecretKeyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `vault_name/secret_key_name`, used as the blob-store path for a secret
/// and as the key into the keyring's parallel `macs` table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SecretPath(String);

impl SecretPath {
    pub fn new(vault: &VaultName, secret_key: &SecretKeyName) -> Self {
        Self(format!("{}/{}", vault.as_str(), secret_key.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Wrapped DEK
// ---------------------------------------------------------------------------

/// A per-secret data-encrypting key, wrapped (AES-256-GCM) under the
/// master key bundle's `kms` key. Stored base64 so the keyring round-trips
/// through canonical JSON without escaping concerns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedDek {
    pub ciphertext_b64: String,
}

impl WrappedDek {
    pub fn new(ciphertext: &[u8]) -> Self {
        Self {
            ciphertext_b64: base64_encode(ciphertext),
        }
    }

    pub fn ciphertext(&self) -> Result<Vec<u8>, crate::error::KeyringError> {
        base64_decode(&self.ciphertext_b64).ok_or(crate::error::KeyringError::KeyringSerializationError)
    }
}

// ---------------------------------------------------------------------------
// Keyring on-disk shape
// ---------------------------------------------------------------------------

/// The keyring's serialized state: a two-level, lexicographically-sorted
/// map of vault → secret key → wrapped DEK, plus a parallel table of
/// per-entry MACs used to detect a wrapped DEK substituted without going
/// through `insert_dek`.
///
/// `BTreeMap` (rather than `HashMap`) is load-bearing: canonical JSON
/// serialization requires keys sorted at every level, and `serde_json`
/// preserves `BTreeMap`'s iteration order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KeyringState {
    pub vault: BTreeMap<VaultName, BTreeMap<SecretKeyName, WrappedDek>>,
    pub macs: BTreeMap<SecretPath, String>,
}

impl KeyringState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_count(&self) -> usize {
        self.vault.values().map(|m| m.len()).sum()
    }

    /// Invariant the concurrency tests fuzz: one MAC per (vault, secret)
    /// entry, never more, never fewer.
    pub fn macs_len_matches_entries(&self) -> bool {
        self.macs.len() == self.entry_count()
    }

    /// Canonical (key-sorted) JSON bytes of this state. `BTreeMap`
    /// serializes in key order already; `serde_json` does not re-order
    /// object keys for us on its own, so every nested map in this type
    /// must already be a `BTreeMap`.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, crate::error::KeyringError> {
        serde_json::to_vec(self).map_err(|_| crate::error::KeyringError::KeyringSerializationError)
    }

    pub fn from_canonical_json(bytes: &[u8]) -> Result<Self, crate::error::KeyringError> {
        serde_json::from_slice(bytes).map_err(|_| crate::error::KeyringError::KeyringSerializationError)
    }
}

// ---------------------------------------------------------------------------
// DEK descriptor
// ---------------------------------------------------------------------------

/// The public (non-secret) half of a DEK descriptor: everything needed to
/// know *what* a wrapped DEK is without being able to reconstruct it.
/// Carried in the clear inside [`SecretEnvelope`] so a reader can identify
/// the DEK's shape before unwrapping it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorPublic {
    #[serde(rename = "type")]
    pub kind: String,
    pub adapter: String,
    pub version: u8,
}

/// The full DEK descriptor `{hex, type, adapter, version}` spec.md §4.4
/// requires be serialized and wrapped under the KMS key in place of the
/// DEK's raw bytes. `hex` is the DEK's own [`vaultcrypt::KeyHandle::export_hex`]
/// blob, so unwrapping and re-importing it exercises the same adapter-tag
/// check as any other imported key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DekDescriptor {
    pub hex: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub adapter: String,
    pub version: u8,
}

impl DekDescriptor {
    pub fn public(&self) -> DescriptorPublic {
        DescriptorPublic {
            kind: self.kind.clone(),
            adapter: self.adapter.clone(),
            version: self.version,
        }
    }
}

// ---------------------------------------------------------------------------
// Secret envelope
// ---------------------------------------------------------------------------

/// The JSON envelope written (MAC-prefixed) to a secret's blob: the
/// wrapped DEK and the ciphertext it decrypts, bound together so the MAC
/// covers both and a reader can't mix one secret's wrapped DEK with
/// another's ciphertext.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecretEnvelope {
    pub wrapped_dek: String,
    pub ciphertext: String,
    pub descriptor_public: DescriptorPublic,
}

impl SecretEnvelope {
    pub fn new(wrapped_dek: &[u8], ciphertext: &[u8], descriptor_public: DescriptorPublic) -> Self {
        Self {
            wrapped_dek: base64_encode(wrapped_dek),
            ciphertext: base64_encode(ciphertext),
            descriptor_public,
        }
    }

    pub fn wrapped_dek(&self) -> Result<Vec<u8>, crate::error::KeyringError> {
        base64_decode(&self.wrapped_dek).ok_or(crate::error::KeyringError::KeyringSerializationError)
    }

    pub fn ciphertext(&self) -> Result<Vec<u8>, crate::error::KeyringError> {
        base64_decode(&self.ciphertext).ok_or(crate::error::KeyringError::KeyringSerializationError)
    }

    pub fn to_canonical_json(&self) -> Result<Vec<u8>, crate::error::KeyringError> {
        serde_json::to_vec(self).map_err(|_| crate::error::KeyringError::KeyringSerializationError)
    }
}

pub(crate) fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub(crate) fn base64_decode(s: &str) -> Option<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(s).ok()
}
