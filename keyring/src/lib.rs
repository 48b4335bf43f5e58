//! Encrypted keyring lifecycle, integrity sidecar, and secret processor
//! built on top of [`vaultcrypt`]'s crypto facade.
//!
//! - [`integrity`] — the 176-byte checksum sidecar (C2)
//! - [`keyring::Keyring`] — vault/secret lifecycle + envelope put/get (C3, C4)
//! - [`master_key`] — the master key bundle and its env/file backends (C5)
//! - [`storage`] — the blob store trait and its two built-in backends

pub mod error;
pub mod integrity;
pub mod keyring;
pub mod master_key;
pub mod storage;
pub mod types;

pub use error::KeyringError;
pub use integrity::ChecksumSidecar;
pub use keyring::Keyring;
pub use master_key::{EnvFileSource, FileSource, MasterKeyBundle, MasterKeySource};
pub use storage::{BlobStore, Connection, FileBlobStore, InMemoryBlobStore};
pub use types::{KeyringState, SecretEnvelope, SecretKeyName, SecretPath, VaultName, WrappedDek};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vaultcrypt::{CryptoFacade, SecurityLevel};

    async fn fresh_keyring() -> Keyring<InMemoryBlobStore> {
        let facade = CryptoFacade::new();
        let bundle = MasterKeyBundle::generate(&facade).expect("bundle generation");
        let store = Arc::new(InMemoryBlobStore::new());
        Keyring::create(facade, store, bundle).await.expect("create keyring")
    }

    /// Every test in this module authenticates its `put`/`get` calls with a
    /// freshly generated auth key rather than the keyring's own bundle
    /// internals (those are a separate, independent MAC layer — see
    /// `Keyring::insert_dek`/`lookup_dek`).
    async fn facade_auth_key<S: BlobStore>(_keyring: &Keyring<S>) -> vaultcrypt::KeyHandle {
        CryptoFacade::new()
            .generate_symmetric_auth_key(None, SecurityLevel::Interactive)
            .expect("generate auth key")
    }

    #[tokio::test]
    async fn put_then_get_round_trips_a_secret() {
        let keyring = fresh_keyring().await;
        let vault = VaultName::new("prod");
        let key = SecretKeyName::new("db-password");
        let value = serde_json::json!({ "password": "hunter2" });

        let auth_key = facade_auth_key(&keyring).await;
        keyring.put(&vault, &key, &value, &auth_key).await.expect("put");
        let got = keyring.get(&vault, &key, &auth_key).await.expect("get");
        assert_eq!(got, value);
    }

    #[tokio::test]
    async fn complex_json_value_round_trips() {
        let keyring = fresh_keyring().await;
        let vault = VaultName::new("app");
        let key = SecretKeyName::new("profile");
        let value = serde_json::json!({ "u": "admin", "roles": ["r", "w"], "n": 42 });

        let auth_key = facade_auth_key(&keyring).await;
        keyring.put(&vault, &key, &value, &auth_key).await.expect("put");
        let got = keyring.get(&vault, &key, &auth_key).await.expect("get");
        assert_eq!(got, value);
    }

    #[tokio::test]
    async fn get_missing_secret_is_not_found() {
        let keyring = fresh_keyring().await;
        let vault = VaultName::new("prod");
        let key = SecretKeyName::new("missing");
        let auth_key = facade_auth_key(&keyring).await;
        let err = keyring.get(&vault, &key, &auth_key).await.unwrap_err();
        assert!(matches!(err, KeyringError::NotFound(_)));
    }

    #[tokio::test]
    async fn put_twice_to_the_same_secret_key_is_rejected_without_replace() {
        let keyring = fresh_keyring().await;
        let vault = VaultName::new("prod");
        let key = SecretKeyName::new("db-password");
        let auth_key = facade_auth_key(&keyring).await;

        keyring
            .put(&vault, &key, &serde_json::json!("first"), &auth_key)
            .await
            .expect("first put");
        let err = keyring
            .put(&vault, &key, &serde_json::json!("second"), &auth_key)
            .await
            .unwrap_err();
        assert_eq!(err, KeyringError::AlreadyExists);

        // The original value survives the rejected overwrite attempt.
        let got = keyring.get(&vault, &key, &auth_key).await.expect("get");
        assert_eq!(got, serde_json::json!("first"));
    }

    #[tokio::test]
    async fn get_with_a_different_auth_key_than_put_used_fails_authentication() {
        let facade = CryptoFacade::new();
        let bundle = MasterKeyBundle::generate(&facade).expect("bundle generation");
        let store = Arc::new(InMemoryBlobStore::new());
        let keyring = Keyring::create(facade, store, bundle).await.expect("create keyring");

        let vault = VaultName::new("prod");
        let key = SecretKeyName::new("api-key");
        let put_auth_key = facade_auth_key(&keyring).await;
        keyring
            .put(&vault, &key, &serde_json::json!("abc123"), &put_auth_key)
            .await
            .expect("put");

        let other_facade = CryptoFacade::new();
        let other_auth_key = other_facade
            .generate_symmetric_auth_key(None, SecurityLevel::Interactive)
            .expect("generate other auth key");

        let err = keyring.get(&vault, &key, &other_auth_key).await.unwrap_err();
        assert_eq!(err, KeyringError::AuthenticationFailure);
    }

    #[tokio::test]
    async fn tampering_a_secret_records_mac_prefix_fails_authentication() {
        let facade = CryptoFacade::new();
        let bundle = MasterKeyBundle::generate(&facade).expect("bundle generation");
        let store = Arc::new(InMemoryBlobStore::new());
        let keyring = Keyring::create(facade, store.clone(), bundle)
            .await
            .expect("create keyring");

        let vault = VaultName::new("prod");
        let key = SecretKeyName::new("api-key");
        let auth_key = facade_auth_key(&keyring).await;
        keyring
            .put(&vault, &key, &serde_json::json!("abc123"), &auth_key)
            .await
            .expect("put");

        let path = SecretPath::new(&vault, &key);
        let mut blob = store.read(Connection::Vault, path.as_str()).unwrap();
        blob[0] ^= 0x01; // flip a bit inside the MAC prefix
        store.write(Connection::Vault, path.as_str(), &blob).unwrap();

        let err = keyring.get(&vault, &key, &auth_key).await.unwrap_err();
        assert_eq!(err, KeyringError::AuthenticationFailure);
    }

    #[tokio::test]
    async fn swapping_mac_prefixes_between_two_secrets_fails_both_reads() {
        let facade = CryptoFacade::new();
        let bundle = MasterKeyBundle::generate(&facade).expect("bundle generation");
        let store = Arc::new(InMemoryBlobStore::new());
        let keyring = Keyring::create(facade, store.clone(), bundle)
            .await
            .expect("create keyring");

        let vault = VaultName::new("prod");
        let key_a = SecretKeyName::new("secret-a");
        let key_b = SecretKeyName::new("secret-b");
        let auth_key = facade_auth_key(&keyring).await;
        keyring
            .put(&vault, &key_a, &serde_json::json!("alpha"), &auth_key)
            .await
            .unwrap();
        keyring
            .put(&vault, &key_b, &serde_json::json!("beta"), &auth_key)
            .await
            .unwrap();

        let path_a = SecretPath::new(&vault, &key_a);
        let path_b = SecretPath::new(&vault, &key_b);
        let mut blob_a = store.read(Connection::Vault, path_a.as_str()).unwrap();
        let mut blob_b = store.read(Connection::Vault, path_b.as_str()).unwrap();

        let mac_len = vaultcrypt::MAC_BYTES;
        let (mac_a, mac_b) = (blob_a[..mac_len].to_vec(), blob_b[..mac_len].to_vec());
        blob_a[..mac_len].copy_from_slice(&mac_b);
        blob_b[..mac_len].copy_from_slice(&mac_a);
        store.write(Connection::Vault, path_a.as_str(), &blob_a).unwrap();
        store.write(Connection::Vault, path_b.as_str(), &blob_b).unwrap();

        assert_eq!(
            keyring.get(&vault, &key_a, &auth_key).await.unwrap_err(),
            KeyringError::AuthenticationFailure
        );
        assert_eq!(
            keyring.get(&vault, &key_b, &auth_key).await.unwrap_err(),
            KeyringError::AuthenticationFailure
        );
    }

    #[tokio::test]
    async fn tampered_checksum_sidecar_byte_fails_with_bad_signature_or_checksum_mismatch() {
        let facade = CryptoFacade::new();
        let bundle = MasterKeyBundle::generate(&facade).expect("bundle generation");
        let store = Arc::new(InMemoryBlobStore::new());
        let keyring = Keyring::create(facade, store.clone(), bundle)
            .await
            .expect("create keyring");
        let auth_key = facade_auth_key(&keyring).await;
        keyring
            .put(&VaultName::new("v"), &SecretKeyName::new("k"), &serde_json::json!(1), &auth_key)
            .await
            .unwrap();

        let mut sidecar_bytes = store.read(Connection::Checksum, "keyring.sidecar").unwrap();
        // Flip a byte inside the signature half (second 88-byte field).
        sidecar_bytes[100] ^= 0x01;
        store
            .write(Connection::Checksum, "keyring.sidecar", &sidecar_bytes)
            .unwrap();

        let facade2 = CryptoFacade::new();
        let err = Keyring::<InMemoryBlobStore>::load(
            facade2,
            store,
            MasterKeyBundle::generate(&CryptoFacade::new()).unwrap(),
        )
        .await
        .unwrap_err();
        // Loaded with an unrelated bundle, so either the checksum or the
        // signature half will disagree first.
        assert!(matches!(
            err,
            KeyringError::ChecksumMismatch | KeyringError::BadSignature
        ));
    }

    #[tokio::test]
    async fn password_derived_signature_keypair_is_deterministic() {
        let facade = CryptoFacade::new();
        let salt: Vec<u8> = (0u8..=0x0f).collect();
        let bundle_a =
            MasterKeyBundle::from_password(&facade, b"apple", &salt, SecurityLevel::Interactive).unwrap();
        let bundle_b =
            MasterKeyBundle::from_password(&facade, b"apple", &salt, SecurityLevel::Interactive).unwrap();

        assert_eq!(
            bundle_a.signature_public_key().raw(),
            bundle_b.signature_public_key().raw()
        );
    }

    #[tokio::test]
    async fn macs_table_stays_in_lockstep_with_vault_entries_under_concurrent_writers() {
        let facade = CryptoFacade::new();
        let bundle = MasterKeyBundle::generate(&facade).expect("bundle generation");
        let store = Arc::new(InMemoryBlobStore::new());
        let keyring = Arc::new(Keyring::create(facade, store, bundle).await.expect("create"));

        let auth_key = facade_auth_key(&keyring).await;
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..16 {
            let keyring = keyring.clone();
            let auth_key = auth_key.clone();
            tasks.spawn(async move {
                let vault = VaultName::new("concurrent");
                let key = SecretKeyName::new(format!("k{i}"));
                keyring.put(&vault, &key, &serde_json::json!(i), &auth_key).await.unwrap();
            });
        }
        while tasks.join_next().await.is_some() {}

        assert_eq!(keyring.entry_count().await, 16);
        assert!(keyring.macs_len_matches_entries().await);
    }

    #[tokio::test]
    async fn file_blob_store_round_trips_a_secret_across_keyring_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(FileBlobStore::new(dir.path()));
        let facade = CryptoFacade::new();
        let bundle = MasterKeyBundle::generate(&facade).expect("bundle generation");

        let vault = VaultName::new("prod");
        let key = SecretKeyName::new("db-password");
        let value = serde_json::json!({ "password": "hunter2" });

        let auth_facade = CryptoFacade::new();
        let auth_key = auth_facade
            .generate_symmetric_auth_key(None, SecurityLevel::Interactive)
            .expect("generate auth key");

        {
            let keyring = Keyring::create(CryptoFacade::new(), store.clone(), bundle_clone(&facade, &bundle))
                .await
                .expect("create keyring");
            keyring.put(&vault, &key, &value, &auth_key).await.expect("put");
        }

        let reloaded = Keyring::load(CryptoFacade::new(), store, bundle_clone(&facade, &bundle))
            .await
            .expect("load keyring");
        let got = reloaded.get(&vault, &key, &auth_key).await.expect("get");
        assert_eq!(got, value);
    }

    /// Re-import a bundle through its hex export so the same key material
    /// can back both the writer and the reader keyring in the reload test
    /// above (`MasterKeyBundle` itself is not `Clone`).
    fn bundle_clone(facade: &CryptoFacade, bundle: &MasterKeyBundle) -> MasterKeyBundle {
        MasterKeyBundle::import(facade, &bundle.export(facade)).expect("re-import bundle")
    }
}
