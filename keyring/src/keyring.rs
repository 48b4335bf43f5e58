//! Keyring Lifecycle (C3) and Secret Processor (C4).
//!
//! Mirrors the shape of the teacher's `Keystore`: public methods are
//! `async fn` over a sync [`BlobStore`], and every mutation stages onto a
//! cloned [`KeyringState`] before committing — if persistence fails or the
//! task is cancelled mid-write, the in-memory state never observes a
//! partial update.

use std::sync::Arc;

use tokio::sync::RwLock;
use vaultcrypt::CryptoFacade;

use crate::error::KeyringError;
use crate::integrity::ChecksumSidecar;
use crate::master_key::MasterKeyBundle;
use crate::storage::{BlobStore, Connection};
use crate::types::{
    DekDescriptor, DescriptorPublic, KeyringState, SecretEnvelope, SecretKeyName, SecretPath, VaultName,
    WrappedDek,
};

const KEYRING_BLOB_NAME: &str = "keyring.json";
const SIDECAR_BLOB_NAME: &str = "keyring.sidecar";

/// A sealed, integrity-checked keyring: the vault → secret → wrapped-DEK
/// map, its parallel MAC table, and the machinery to persist/verify both.
pub struct Keyring<S: BlobStore> {
    facade: CryptoFacade,
    store: Arc<S>,
    bundle: MasterKeyBundle,
    state: RwLock<KeyringState>,
}

impl<S: BlobStore> Keyring<S> {
    /// Create a brand-new, empty, sealed keyring. Fails with
    /// [`KeyringError::AlreadyExists`] if a keyring blob is already
    /// present at the `Keyring` connection — callers that want to
    /// overwrite must `delete` first (mirrors the `setup --force` CLI
    /// semantics, which call `delete` before `create`).
    pub async fn create(facade: CryptoFacade, store: Arc<S>, bundle: MasterKeyBundle) -> Result<Self, KeyringError> {
        store.mkdir(Connection::Keyring)?;
        store.mkdir(Connection::Checksum)?;
        store.mkdir(Connection::Vault)?;

        if store.has(Connection::Keyring, KEYRING_BLOB_NAME)? {
            return Err(KeyringError::AlreadyExists);
        }

        let keyring = Self {
            facade,
            store,
            bundle,
            state: RwLock::new(KeyringState::new()),
        };
        keyring.seal().await?;
        Ok(keyring)
    }

    /// Load an existing keyring, verifying its checksum sidecar before
    /// trusting the parsed state.
    pub async fn load(facade: CryptoFacade, store: Arc<S>, bundle: MasterKeyBundle) -> Result<Self, KeyringError> {
        let bytes = store.read(Connection::Keyring, KEYRING_BLOB_NAME)?;
        let sidecar_bytes = store.read(Connection::Checksum, SIDECAR_BLOB_NAME)?;
        let sidecar = ChecksumSidecar::parse(&sidecar_bytes)?;
        sidecar.verify(&facade, &bundle, &bytes)?;

        let state = KeyringState::from_canonical_json(&bytes)?;
        if !state.macs_len_matches_entries() {
            return Err(KeyringError::KeyringInconsistent);
        }

        Ok(Self {
            facade,
            store,
            bundle,
            state: RwLock::new(state),
        })
    }

    /// Persist the current state and (re)generate its checksum sidecar.
    /// The single writer lock for the whole operation: callers that
    /// mutate `self.state` take the write lock for the duration of their
    /// mutation *and* the following `seal`, so no other task ever
    /// observes keyring bytes and sidecar bytes that don't match.
    async fn seal(&self) -> Result<(), KeyringError> {
        let state = self.state.read().await;
        let bytes = state.to_canonical_json()?;
        let sidecar = ChecksumSidecar::generate(&self.facade, &self.bundle, &bytes)?;
        drop(state);

        self.store.write(Connection::Keyring, KEYRING_BLOB_NAME, &bytes)?;
        self.store
            .set_visibility(Connection::Keyring, KEYRING_BLOB_NAME, true)?;
        self.store
            .write(Connection::Checksum, SIDECAR_BLOB_NAME, &sidecar.serialize())?;
        self.store
            .set_visibility(Connection::Checksum, SIDECAR_BLOB_NAME, true)?;
        Ok(())
    }

    // -- C3: DEK table lifecycle ----------------------------------------

    /// Serialize `dek`'s descriptor `{hex, type, adapter, version}` and
    /// wrap it under the bundle's `kms` key. Wrapping the descriptor
    /// rather than the DEK's raw bytes means a reader reconstructs the
    /// DEK via [`vaultcrypt::CryptoFacade::import_key`] — the same
    /// adapter-tag check any other imported key goes through.
    fn wrap_dek(&self, dek: &vaultcrypt::KeyHandle, aad: &[u8]) -> Result<Vec<u8>, KeyringError> {
        let descriptor = DekDescriptor {
            hex: self.facade.export_key(dek),
            kind: dek.kind().as_str().to_string(),
            adapter: dek.adapter().to_string(),
            version: dek.version(),
        };
        let json = serde_json::to_vec(&descriptor).map_err(|_| KeyringError::SerializationError)?;
        self.facade
            .encrypt_message(self.bundle.kms_key(), &json, aad)
            .map_err(KeyringError::from)
    }

    fn unwrap_dek(&self, wrapped: &[u8], aad: &[u8]) -> Result<vaultcrypt::KeyHandle, KeyringError> {
        let json = self
            .facade
            .decrypt_message(self.bundle.kms_key(), wrapped, aad)?;
        let descriptor: DekDescriptor =
            serde_json::from_slice(&json).map_err(|_| KeyringError::SerializationError)?;
        self.facade
            .import_key(&descriptor.hex)
            .map_err(KeyringError::from)
    }

    /// Wrap `dek` under the bundle's `kms` key and insert it into the
    /// vault/secret map, staging onto a cloned state so a failed write
    /// never leaves the in-memory keyring ahead of disk. Per spec.md
    /// §4.3 InsertDek, forbids silently overwriting an existing
    /// `(vault, secret_key)` entry unless `replace` is true.
    async fn insert_dek(
        &self,
        vault: &VaultName,
        secret_key: &SecretKeyName,
        dek: &vaultcrypt::KeyHandle,
        replace: bool,
    ) -> Result<(), KeyringError> {
        let path = SecretPath::new(vault, secret_key);

        let mut guard = self.state.write().await;
        if !replace
            && guard
                .vault
                .get(vault)
                .map(|m| m.contains_key(secret_key))
                .unwrap_or(false)
        {
            return Err(KeyringError::AlreadyExists);
        }

        let wrapped_ct = self.wrap_dek(dek, path.as_str().as_bytes())?;
        let wrapped = WrappedDek::new(&wrapped_ct);
        let mac = self.facade.checksum(self.bundle.checksum_key(), &wrapped_ct)?;

        let mut staged = guard.clone();
        staged
            .vault
            .entry(vault.clone())
            .or_default()
            .insert(secret_key.clone(), wrapped);
        staged.macs.insert(path, hex::encode(mac));
        *guard = staged;
        drop(guard);

        self.seal().await
    }

    /// Confirm the keyring's own vault/macs bookkeeping table still has an
    /// entry for `(vault, secret_key)` and that its parallel MAC agrees —
    /// spec.md §4.3 LookupDek returns `(wrapped_dek, mac)` or `NotFound`;
    /// this implementation only needs the presence/consistency check, not
    /// the bytes themselves, since a secret record carries its own wrapped
    /// DEK in its envelope (see [`Keyring::get`]). A mismatch here is
    /// [`KeyringError::KeyringInconsistent`] — the vault map and the macs
    /// table disagree — distinct from a tampered secret *record*, which
    /// surfaces as [`KeyringError::AuthenticationFailure`].
    async fn lookup_dek(&self, vault: &VaultName, secret_key: &SecretKeyName) -> Result<(), KeyringError> {
        let path = SecretPath::new(vault, secret_key);
        let guard = self.state.read().await;

        let wrapped = guard
            .vault
            .get(vault)
            .and_then(|m| m.get(secret_key))
            .ok_or_else(|| KeyringError::NotFound(path.to_string()))?;
        let wrapped_ct = wrapped.ciphertext()?;

        let expected_mac = guard
            .macs
            .get(&path)
            .ok_or(KeyringError::KeyringInconsistent)?;
        let mac = self.facade.checksum(self.bundle.checksum_key(), &wrapped_ct)?;
        if hex::encode(mac) != *expected_mac {
            return Err(KeyringError::KeyringInconsistent);
        }
        Ok(())
    }

    /// Remove a secret's DEK entry (and, separately, callers should
    /// delete its blob from the `Vault` connection).
    pub async fn remove(&self, vault: &VaultName, secret_key: &SecretKeyName) -> Result<(), KeyringError> {
        let path = SecretPath::new(vault, secret_key);
        let mut guard = self.state.write().await;
        let mut staged = guard.clone();
        let removed = staged
            .vault
            .get_mut(vault)
            .map(|m| m.remove(secret_key).is_some())
            .unwrap_or(false);
        if !removed {
            return Err(KeyringError::NotFound(path.to_string()));
        }
        if staged.vault.get(vault).map(|m| m.is_empty()).unwrap_or(false) {
            staged.vault.remove(vault);
        }
        staged.macs.remove(&path);
        *guard = staged;
        drop(guard);

        self.seal().await?;
        self.store.delete(Connection::Vault, path.as_str())
    }

    // -- C4: secret processor ---------------------------------------------

    /// Envelope-encrypt `value` under a fresh ephemeral DEK, MAC the
    /// wrapped-DEK-plus-ciphertext envelope under `auth_key`, write the
    /// MAC-prefixed envelope to the `Vault` connection, and record the
    /// wrapped DEK in the keyring's own bookkeeping table. Fails with
    /// [`KeyringError::AlreadyExists`] if `(vault, secret_key)` is already
    /// occupied — callers that want to overwrite must `remove` first.
    pub async fn put(
        &self,
        vault: &VaultName,
        secret_key: &SecretKeyName,
        value: &serde_json::Value,
        auth_key: &vaultcrypt::KeyHandle,
    ) -> Result<(), KeyringError> {
        let path = SecretPath::new(vault, secret_key);
        let dek = self
            .facade
            .generate_symmetric_encryption_key(None, vaultcrypt::SecurityLevel::Interactive)?;

        let plaintext = serde_json::to_vec(value).map_err(|_| KeyringError::SerializationError)?;
        let ciphertext = self.facade.encrypt_message(&dek, &plaintext, path.as_str().as_bytes())?;

        let wrapped_dek = self.wrap_dek(&dek, path.as_str().as_bytes())?;
        let descriptor_public = DescriptorPublic {
            kind: dek.kind().as_str().to_string(),
            adapter: dek.adapter().to_string(),
            version: dek.version(),
        };
        let envelope = SecretEnvelope::new(&wrapped_dek, &ciphertext, descriptor_public);
        let e = envelope.to_canonical_json()?;

        let m = self.facade.checksum(auth_key, &e)?;
        let mut blob = Vec::with_capacity(m.len() + e.len());
        blob.extend_from_slice(&m);
        blob.extend_from_slice(&e);

        self.store.write(Connection::Vault, path.as_str(), &blob)?;
        self.store.set_visibility(Connection::Vault, path.as_str(), true)?;

        // Record the DEK after the blob lands, so a crash between the two
        // writes leaves an orphaned blob (harmless) rather than a wrapped
        // DEK with nothing to decrypt.
        self.insert_dek(vault, secret_key, &dek, false).await
    }

    /// Read and decrypt the secret at `(vault, secret_key)`. `auth_key`
    /// must match the key `put` MAC'd the envelope under, or this fails
    /// with [`KeyringError::AuthenticationFailure`] before any decryption
    /// is attempted.
    pub async fn get(
        &self,
        vault: &VaultName,
        secret_key: &SecretKeyName,
        auth_key: &vaultcrypt::KeyHandle,
    ) -> Result<serde_json::Value, KeyringError> {
        let path = SecretPath::new(vault, secret_key);

        // Bookkeeping check: the keyring's own vault/macs table must still
        // agree this entry exists. The DEK used below comes from the
        // envelope's own wrapped DEK, not this table.
        self.lookup_dek(vault, secret_key).await?;

        let blob = self.store.read(Connection::Vault, path.as_str())?;
        if blob.len() < vaultcrypt::MAC_BYTES {
            return Err(KeyringError::AuthenticationFailure);
        }
        let (mac_prefix, e) = blob.split_at(vaultcrypt::MAC_BYTES);
        let mac_prefix: [u8; vaultcrypt::MAC_BYTES] = mac_prefix
            .try_into()
            .map_err(|_| KeyringError::AuthenticationFailure)?;

        if !self.facade.authenticate_verify(auth_key, e, &mac_prefix) {
            return Err(KeyringError::AuthenticationFailure);
        }

        let envelope: SecretEnvelope =
            serde_json::from_slice(e).map_err(|_| KeyringError::SerializationError)?;
        let wrapped_dek = envelope.wrapped_dek()?;
        let dek = self.unwrap_dek(&wrapped_dek, path.as_str().as_bytes())?;

        let ciphertext = envelope.ciphertext()?;
        let plaintext = self
            .facade
            .decrypt_message(&dek, &ciphertext, path.as_str().as_bytes())?;

        serde_json::from_slice(&plaintext).map_err(|_| KeyringError::SerializationError)
    }

    /// Snapshot of how many (vault, secret) entries exist — exposed for
    /// the concurrency invariant tests.
    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entry_count()
    }

    pub async fn macs_len_matches_entries(&self) -> bool {
        self.state.read().await.macs_len_matches_entries()
    }
}
