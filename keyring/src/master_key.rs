//! Master Key Provider (C5): the four long-lived keys that anchor a
//! keyring — a symmetric DEK-wrapping key, a symmetric MAC key for the
//! integrity engine and secret-record authentication, and an Ed25519
//! signing keypair for the checksum sidecar.

use std::collections::HashMap;

use vaultcrypt::{CryptoFacade, KeyHandle, KeyKind, SecurityLevel};

use crate::error::KeyringError;

/// The four key names a [`MasterKeySource`] stores/loads independently.
/// Order has no significance; every backend addresses these by name, not
/// by position.
pub const MASTER_KEY_NAMES: [&str; 4] = ["kms", "auth", "sig_secret", "sig_public"];

/// The master key material for one keyring. Never persisted in cleartext
/// except under a [`MasterKeySource`] backend the operator chose
/// (env file, 0600 files, ...); this struct itself has no opinion about
/// where its bytes live.
pub struct MasterKeyBundle {
    kms: KeyHandle,
    auth: KeyHandle,
    sig_secret: KeyHandle,
    sig_public: KeyHandle,
}

impl MasterKeyBundle {
    /// Generate a fresh bundle from the system CSPRNG.
    pub fn generate(facade: &CryptoFacade) -> Result<Self, KeyringError> {
        let kms = facade.generate_symmetric_encryption_key(None, SecurityLevel::Interactive)?;
        let auth = facade.generate_symmetric_auth_key(None, SecurityLevel::Interactive)?;
        let (sig_public, sig_secret) =
            facade.generate_signature_keypair(None, SecurityLevel::Interactive)?;
        Ok(Self {
            kms,
            auth,
            sig_secret,
            sig_public,
        })
    }

    /// Derive a bundle deterministically from a password and salt (the
    /// §8 "password-derived signature keypair" scenario applies to the
    /// whole bundle, not just the signature half, so the same derivation
    /// discipline covers `kms` and `auth` too).
    pub fn from_password(
        facade: &CryptoFacade,
        password: &[u8],
        salt: &[u8],
        security_level: SecurityLevel,
    ) -> Result<Self, KeyringError> {
        let kms_salt = derive_sub_salt(salt, b"kms");
        let auth_salt = derive_sub_salt(salt, b"auth");
        let sig_salt = derive_sub_salt(salt, b"sig");

        let kms =
            facade.generate_symmetric_encryption_key(Some((password, &kms_salt)), security_level)?;
        let auth = facade.generate_symmetric_auth_key(Some((password, &auth_salt)), security_level)?;
        let (sig_public, sig_secret) =
            facade.generate_signature_keypair(Some((password, &sig_salt)), security_level)?;

        Ok(Self {
            kms,
            auth,
            sig_secret,
            sig_public,
        })
    }

    pub fn kms_key(&self) -> &KeyHandle {
        &self.kms
    }

    pub fn checksum_key(&self) -> &KeyHandle {
        &self.auth
    }

    pub fn signature_secret_key(&self) -> &KeyHandle {
        &self.sig_secret
    }

    pub fn signature_public_key(&self) -> &KeyHandle {
        &self.sig_public
    }

    /// Hex-export the full bundle (`kms|auth|sig_secret|sig_public`, each
    /// itself a [`KeyHandle::export_hex`] blob joined by newlines). Kept
    /// for callers (and tests) that want to re-import a bundle as a single
    /// unit; [`MasterKeySource`] itself now persists each key under its own
    /// name via [`Self::named_hex`]/[`Self::from_named_hex`].
    pub fn export(&self, facade: &CryptoFacade) -> String {
        [
            facade.export_key(&self.kms),
            facade.export_key(&self.auth),
            facade.export_key(&self.sig_secret),
            facade.export_key(&self.sig_public),
        ]
        .join("\n")
    }

    pub fn import(facade: &CryptoFacade, blob: &str) -> Result<Self, KeyringError> {
        let mut lines = blob.lines();
        let mut next = |kind: KeyKind| -> Result<KeyHandle, KeyringError> {
            let line = lines.next().ok_or(KeyringError::LoaderFailed(format!(
                "master key bundle missing {kind} field"
            )))?;
            import_checked(facade, line, kind)
        };

        let kms = next(KeyKind::SymmetricEncryptionKey)?;
        let auth = next(KeyKind::SymmetricAuthenticationKey)?;
        let sig_secret = next(KeyKind::AsymmetricSignatureSecretKey)?;
        let sig_public = next(KeyKind::AsymmetricSignaturePublicKey)?;

        Ok(Self {
            kms,
            auth,
            sig_secret,
            sig_public,
        })
    }

    /// Each key's own `export_hex` blob, addressed by the name a
    /// [`MasterKeySource`] should store it under.
    pub fn named_hex(&self, facade: &CryptoFacade) -> [(&'static str, String); 4] {
        [
            ("kms", facade.export_key(&self.kms)),
            ("auth", facade.export_key(&self.auth)),
            ("sig_secret", facade.export_key(&self.sig_secret)),
            ("sig_public", facade.export_key(&self.sig_public)),
        ]
    }

    /// Reconstruct a bundle from a name → hex-blob map, the shape every
    /// [`MasterKeySource`]'s default `load` assembles from 4 independent
    /// `require(name)` calls.
    pub fn from_named_hex(
        facade: &CryptoFacade,
        hex_by_name: &HashMap<&str, String>,
    ) -> Result<Self, KeyringError> {
        let mut get = |name: &str, kind: KeyKind| -> Result<KeyHandle, KeyringError> {
            let hex = hex_by_name
                .get(name)
                .ok_or_else(|| KeyringError::LoaderFailed(format!("missing {name} field")))?;
            import_checked(facade, hex, kind)
        };

        let kms = get("kms", KeyKind::SymmetricEncryptionKey)?;
        let auth = get("auth", KeyKind::SymmetricAuthenticationKey)?;
        let sig_secret = get("sig_secret", KeyKind::AsymmetricSignatureSecretKey)?;
        let sig_public = get("sig_public", KeyKind::AsymmetricSignaturePublicKey)?;

        Ok(Self {
            kms,
            auth,
            sig_secret,
            sig_public,
        })
    }
}

fn import_checked(facade: &CryptoFacade, hex: &str, kind: KeyKind) -> Result<KeyHandle, KeyringError> {
    let key = facade
        .import_key(hex)
        .map_err(|_| KeyringError::LoaderFailed(format!("malformed {kind} field")))?;
    if key.kind() != kind {
        return Err(KeyringError::LoaderFailed(format!(
            "expected {kind}, found {}",
            key.kind()
        )));
    }
    Ok(key)
}

fn derive_sub_salt(salt: &[u8], label: &[u8]) -> Vec<u8> {
    let mut out = salt.to_vec();
    out.extend_from_slice(label);
    out
}

// ---------------------------------------------------------------------------
// Master key source backends
// ---------------------------------------------------------------------------

/// Where the master key bundle comes from at process start. Implementors
/// need only handle one key at a time, by name (one of
/// [`MASTER_KEY_NAMES`]); `load`/`store` assemble/disassemble a full
/// [`MasterKeyBundle`] on top via 4 independent per-key calls, so a
/// backend gets whole-bundle load/store for free.
#[async_trait::async_trait]
pub trait MasterKeySource: Send + Sync {
    /// Fetch the raw stored bytes for one named key (its own
    /// `export_hex` blob, as written by `store_key`). `NotFound` or
    /// equivalent if the key has never been stored.
    async fn require(&self, name: &str) -> Result<Vec<u8>, KeyringError>;

    /// Persist the raw bytes for one named key, overwriting any previous
    /// value under that name.
    async fn store_key(&self, name: &str, bytes: &[u8]) -> Result<(), KeyringError>;

    /// Whether every key in [`MASTER_KEY_NAMES`] has already been stored.
    /// Backends that can answer this cheaper than 4 `require` calls (e.g.
    /// a directory listing) should do so; the default here is the
    /// straightforward one.
    async fn is_initialized(&self) -> Result<bool, KeyringError>;

    async fn load(&self, facade: &CryptoFacade) -> Result<MasterKeyBundle, KeyringError> {
        let mut hex_by_name = HashMap::new();
        for name in MASTER_KEY_NAMES {
            let bytes = self.require(name).await?;
            let hex = String::from_utf8(bytes)
                .map_err(|e| KeyringError::LoaderFailed(format!("{name} is not valid utf-8: {e}")))?;
            hex_by_name.insert(name, hex.trim().to_string());
        }
        MasterKeyBundle::from_named_hex(facade, &hex_by_name)
    }

    async fn store(&self, facade: &CryptoFacade, bundle: &MasterKeyBundle) -> Result<(), KeyringError> {
        for (name, hex) in bundle.named_hex(facade) {
            self.store_key(name, hex.as_bytes()).await?;
        }
        Ok(())
    }
}

/// Loads each master key from its own `VAULTCRYPT_MASTER_KEY_<NAME>` entry
/// (`dotenvy`-style `KEY=VALUE` lines) in a single env file, rather than
/// one escaped whole-bundle entry — so a single key can be rotated and
/// rewritten without touching the other three lines.
pub struct EnvFileSource {
    path: std::path::PathBuf,
}

impl EnvFileSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn var_name(name: &str) -> String {
        format!("VAULTCRYPT_MASTER_KEY_{}", name.to_uppercase())
    }

    async fn read_vars(&self) -> Vec<(String, String)> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => dotenvy::from_read_iter(contents.as_bytes())
                .filter_map(|item| item.ok())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl MasterKeySource for EnvFileSource {
    async fn require(&self, name: &str) -> Result<Vec<u8>, KeyringError> {
        let var = Self::var_name(name);
        self.read_vars()
            .await
            .into_iter()
            .find(|(key, _)| *key == var)
            .map(|(_, value)| value.into_bytes())
            .ok_or(KeyringError::MasterKeyMissing)
    }

    async fn store_key(&self, name: &str, bytes: &[u8]) -> Result<(), KeyringError> {
        let value = String::from_utf8(bytes.to_vec())
            .map_err(|e| KeyringError::LoaderFailed(format!("{name} is not valid utf-8: {e}")))?;
        let var = Self::var_name(name);

        let mut vars = self.read_vars().await;
        vars.retain(|(key, _)| *key != var);
        vars.push((var, value));

        let contents: String = vars.iter().map(|(k, v)| format!("{k}={v}\n")).collect();
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| KeyringError::LoaderFailed(format!("write env file: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(meta) = tokio::fs::metadata(&self.path).await {
                let mut perms = meta.permissions();
                perms.set_mode(0o600);
                let _ = tokio::fs::set_permissions(&self.path, perms).await;
            }
        }
        Ok(())
    }

    async fn is_initialized(&self) -> Result<bool, KeyringError> {
        let vars = self.read_vars().await;
        Ok(MASTER_KEY_NAMES
            .iter()
            .all(|name| vars.iter().any(|(key, _)| *key == Self::var_name(name))))
    }
}

/// Loads each master key from its own `0600` file (`<name>.key`) under a
/// directory, rather than one combined bundle file — so a single key can
/// be rotated by overwriting one file.
pub struct FileSource {
    dir: std::path::PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, name: &str) -> std::path::PathBuf {
        self.dir.join(format!("{name}.key"))
    }
}

#[async_trait::async_trait]
impl MasterKeySource for FileSource {
    async fn require(&self, name: &str) -> Result<Vec<u8>, KeyringError> {
        tokio::fs::read(self.key_path(name))
            .await
            .map_err(|e| KeyringError::LoaderFailed(format!("read {name}: {e}")))
    }

    async fn store_key(&self, name: &str, bytes: &[u8]) -> Result<(), KeyringError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| KeyringError::LoaderFailed(format!("mkdir {:?}: {e}", self.dir)))?;
        let path = self.key_path(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| KeyringError::LoaderFailed(format!("write {name}: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(meta) = tokio::fs::metadata(&path).await {
                let mut perms = meta.permissions();
                perms.set_mode(0o600);
                let _ = tokio::fs::set_permissions(&path, perms).await;
            }
        }
        Ok(())
    }

    async fn is_initialized(&self) -> Result<bool, KeyringError> {
        for name in MASTER_KEY_NAMES {
            if !tokio::fs::try_exists(self.key_path(name)).await.unwrap_or(false) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
