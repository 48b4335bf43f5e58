//! Key handles: a single discriminated-union type for every key this facade
//! produces, dispatched by a total `match` rather than any trait-object
//! registry or reflection.

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Adapter identity stamped into every key this facade produces. `import_key`
/// rejects a blob whose adapter tag does not match — keys minted by one
/// backend are not fungible with another's.
pub const ADAPTER_TAG: &str = "vaultcrypt-local";

/// The eight key shapes the facade recognizes. Parent variants
/// (`AsymmetricEncryptionKeypair`, `AsymmetricSignatureKeypair`) expand into
/// their two child halves via [`KeyKind::expand_children`]; a request that
/// names the parent resolves to whichever child half the operation needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyKind {
    SymmetricEncryptionKey,
    SymmetricAuthenticationKey,
    AsymmetricEncryptionKeypair,
    AsymmetricEncryptionPublicKey,
    AsymmetricEncryptionSecretKey,
    AsymmetricSignatureKeypair,
    AsymmetricSignaturePublicKey,
    AsymmetricSignatureSecretKey,
}

impl KeyKind {
    pub fn is_keypair(&self) -> bool {
        matches!(
            self,
            Self::AsymmetricEncryptionKeypair | Self::AsymmetricSignatureKeypair
        )
    }

    pub fn is_public_key(&self) -> bool {
        matches!(
            self,
            Self::AsymmetricEncryptionPublicKey | Self::AsymmetricSignaturePublicKey
        )
    }

    pub fn is_secret_key(&self) -> bool {
        matches!(
            self,
            Self::AsymmetricEncryptionSecretKey | Self::AsymmetricSignatureSecretKey
        )
    }

    /// Parent keypair tags expand to their two child halves; every other
    /// tag expands to itself. Used when a request names a keypair tag but
    /// the operation needs a specific half (e.g. `seal` needs the public
    /// half, `unseal` needs the secret half).
    pub fn expand_children(&self) -> &'static [KeyKind] {
        match self {
            Self::AsymmetricEncryptionKeypair => &[
                Self::AsymmetricEncryptionPublicKey,
                Self::AsymmetricEncryptionSecretKey,
            ],
            Self::AsymmetricSignatureKeypair => &[
                Self::AsymmetricSignaturePublicKey,
                Self::AsymmetricSignatureSecretKey,
            ],
            Self::SymmetricEncryptionKey => &[Self::SymmetricEncryptionKey],
            Self::SymmetricAuthenticationKey => &[Self::SymmetricAuthenticationKey],
            Self::AsymmetricEncryptionPublicKey => &[Self::AsymmetricEncryptionPublicKey],
            Self::AsymmetricEncryptionSecretKey => &[Self::AsymmetricEncryptionSecretKey],
            Self::AsymmetricSignaturePublicKey => &[Self::AsymmetricSignaturePublicKey],
            Self::AsymmetricSignatureSecretKey => &[Self::AsymmetricSignatureSecretKey],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SymmetricEncryptionKey => "symmetric_encryption_key",
            Self::SymmetricAuthenticationKey => "symmetric_authentication_key",
            Self::AsymmetricEncryptionKeypair => "asymmetric_encryption_keypair",
            Self::AsymmetricEncryptionPublicKey => "asymmetric_encryption_public_key",
            Self::AsymmetricEncryptionSecretKey => "asymmetric_encryption_secret_key",
            Self::AsymmetricSignatureKeypair => "asymmetric_signature_keypair",
            Self::AsymmetricSignaturePublicKey => "asymmetric_signature_public_key",
            Self::AsymmetricSignatureSecretKey => "asymmetric_signature_secret_key",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A buffer holding cleartext or raw key material. Its `Debug` impl never
/// prints the contents; the backing bytes are zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SensitiveBytes(Vec<u8>);

impl SensitiveBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBytes(..{} bytes..)", self.0.len())
    }
}

impl From<Vec<u8>> for SensitiveBytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for SensitiveBytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

/// A single key: its kind, raw bytes, the adapter that minted it, and a
/// format version for forward compatibility on import/export.
#[derive(Clone)]
pub struct KeyHandle {
    kind: KeyKind,
    raw: SensitiveBytes,
    adapter: String,
    version: u8,
}

pub const KEY_HANDLE_VERSION: u8 = 1;

impl KeyHandle {
    pub fn new(kind: KeyKind, raw: impl Into<SensitiveBytes>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            adapter: String::from(ADAPTER_TAG),
            version: KEY_HANDLE_VERSION,
        }
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn raw(&self) -> &[u8] {
        self.raw.as_slice()
    }

    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Hex-encode `adapter|version|kind|raw` for storage/transport.
    pub fn export_hex(&self) -> String {
        let mut buf = Vec::with_capacity(self.raw.len() + 64);
        buf.extend_from_slice(self.adapter.as_bytes());
        buf.push(b'|');
        buf.extend_from_slice(self.version.to_string().as_bytes());
        buf.push(b'|');
        buf.extend_from_slice(self.kind.as_str().as_bytes());
        buf.push(b'|');
        buf.extend_from_slice(hex::encode(self.raw.as_slice()).as_bytes());
        hex::encode(buf)
    }

    /// Parse a blob produced by [`KeyHandle::export_hex`]. Rejects blobs
    /// minted by a different adapter tag (see [`ADAPTER_TAG`]).
    pub fn import_hex(blob: &str) -> Result<Self, crate::error::CryptoError> {
        let decoded = hex::decode(blob).map_err(|_| crate::error::CryptoError::Encoding)?;
        let text = String::from_utf8(decoded).map_err(|_| crate::error::CryptoError::Encoding)?;
        let mut parts = text.splitn(4, '|');
        let adapter = parts.next().ok_or(crate::error::CryptoError::Encoding)?;
        let version: u8 = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or(crate::error::CryptoError::Encoding)?;
        let kind_str = parts.next().ok_or(crate::error::CryptoError::Encoding)?;
        let raw_hex = parts.next().ok_or(crate::error::CryptoError::Encoding)?;

        if adapter != ADAPTER_TAG {
            return Err(crate::error::CryptoError::WrongKeyType {
                expected: String::from(ADAPTER_TAG),
                found: String::from(adapter),
            });
        }

        let kind = kind_from_str(kind_str).ok_or(crate::error::CryptoError::Encoding)?;
        let raw = hex::decode(raw_hex).map_err(|_| crate::error::CryptoError::Encoding)?;

        Ok(Self {
            kind,
            raw: SensitiveBytes::new(raw),
            adapter: String::from(adapter),
            version,
        })
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandle")
            .field("kind", &self.kind)
            .field("adapter", &self.adapter)
            .field("version", &self.version)
            .field("raw", &self.raw)
            .finish()
    }
}

fn kind_from_str(s: &str) -> Option<KeyKind> {
    Some(match s {
        "symmetric_encryption_key" => KeyKind::SymmetricEncryptionKey,
        "symmetric_authentication_key" => KeyKind::SymmetricAuthenticationKey,
        "asymmetric_encryption_keypair" => KeyKind::AsymmetricEncryptionKeypair,
        "asymmetric_encryption_public_key" => KeyKind::AsymmetricEncryptionPublicKey,
        "asymmetric_encryption_secret_key" => KeyKind::AsymmetricEncryptionSecretKey,
        "asymmetric_signature_keypair" => KeyKind::AsymmetricSignatureKeypair,
        "asymmetric_signature_public_key" => KeyKind::AsymmetricSignaturePublicKey,
        "asymmetric_signature_secret_key" => KeyKind::AsymmetricSignatureSecretKey,
        _ => return None,
    })
}
