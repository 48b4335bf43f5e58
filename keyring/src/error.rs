//! Error types for the keyring crate.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyringError {
    /// The 176-byte checksum sidecar could not be parsed into its
    /// checksum/signature halves.
    MalformedSidecar,
    /// The keyring's keyed-BLAKE2b-512 checksum did not match.
    ChecksumMismatch,
    /// The checksum sidecar's Ed25519 signature did not verify.
    BadSignature,
    /// The keyring's own JSON state could not be serialized/deserialized.
    KeyringSerializationError,
    /// A key handle of the wrong [`vaultcrypt::KeyKind`] was supplied to
    /// an operation.
    WrongKeyType,
    /// An operation needed a key the caller did not supply.
    MissingRequiredKey,
    /// A secret record's MAC prefix did not match its envelope bytes.
    /// Distinct from a ciphertext/AEAD failure — this fails *before* the
    /// DEK ever touches the ciphertext.
    AuthenticationFailure,
    /// The DEK-level AES-256-GCM operation failed (wrong DEK, tampered
    /// ciphertext, or truncated envelope).
    AeadFailure,
    /// The configured [`crate::storage::BlobStore`] returned an error.
    BlobStoreError(String),
    /// The keyring's `vault` map and its parallel `macs` table disagree
    /// on entry count or keys.
    KeyringInconsistent,
    /// A value could not be serialized to/from canonical JSON.
    SerializationError,
    /// The configured [`crate::master_key::MasterKeySource`] has no
    /// master key bundle to return.
    MasterKeyMissing,
    /// The master key source's backend failed to load or parse the
    /// bundle it does have.
    LoaderFailed(String),
    /// The named vault or secret does not exist.
    NotFound(String),
    /// `create` was called against a connection that already holds a
    /// sealed keyring (or `setup` without `--force`).
    AlreadyExists,
}

impl fmt::Display for KeyringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSidecar => write!(f, "malformed checksum sidecar"),
            Self::ChecksumMismatch => write!(f, "keyring checksum mismatch"),
            Self::BadSignature => write!(f, "keyring signature verification failed"),
            Self::KeyringSerializationError => write!(f, "keyring serialization error"),
            Self::WrongKeyType => write!(f, "wrong key type"),
            Self::MissingRequiredKey => write!(f, "missing required key"),
            Self::AuthenticationFailure => write!(f, "secret record authentication failed"),
            Self::AeadFailure => write!(f, "secret record decryption failed"),
            Self::BlobStoreError(msg) => write!(f, "blob store error: {msg}"),
            Self::KeyringInconsistent => write!(f, "keyring vault/macs tables are inconsistent"),
            Self::SerializationError => write!(f, "serialization error"),
            Self::MasterKeyMissing => write!(f, "no master key bundle available"),
            Self::LoaderFailed(msg) => write!(f, "master key source failed: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::AlreadyExists => write!(f, "already exists"),
        }
    }
}

impl std::error::Error for KeyringError {}

impl From<vaultcrypt::CryptoError> for KeyringError {
    fn from(e: vaultcrypt::CryptoError) -> Self {
        match e {
            vaultcrypt::CryptoError::WrongKeyType { .. } => Self::WrongKeyType,
            vaultcrypt::CryptoError::MissingRequiredKey => Self::MissingRequiredKey,
            vaultcrypt::CryptoError::Decryption => Self::AeadFailure,
            vaultcrypt::CryptoError::Encoding | vaultcrypt::CryptoError::BackendFailure => {
                Self::SerializationError
            }
        }
    }
}
