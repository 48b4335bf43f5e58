//! Blob Store: the external storage interface (spec'd External Interfaces
//! §6) plus the five reserved logical connections.

use crate::error::KeyringError;

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::RwLock;

// ---------------------------------------------------------------------------
// Reserved connections
// ---------------------------------------------------------------------------

/// The five logical connections a deployment wires up independently. Each
/// resolves to its own root under a [`BlobStore`] implementation — nothing
/// requires them to live on the same filesystem or even the same host.
/// (Operators who want the checksum sidecar stored separately from the
/// keyring it covers — so a single compromised host can't forge both —
/// can point `Checksum` and `Keyring` at different [`FileBlobStore`] roots;
/// this crate does not enforce that split, it only makes it possible.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connection {
    Keyring,
    Checksum,
    Environment,
    MasterKeys,
    Vault,
}

impl Connection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyring => "keyring",
            Self::Checksum => "checksum",
            Self::Environment => "environment",
            Self::MasterKeys => "master_keys",
            Self::Vault => "vault",
        }
    }
}

// ---------------------------------------------------------------------------
// Blob store trait
// ---------------------------------------------------------------------------

/// Where keyring state, checksums, master key material, and secret
/// envelopes live. Implement this for your infrastructure (object store,
/// database, HSM-backed filesystem, ...).
pub trait BlobStore: Send + Sync {
    fn has(&self, conn: Connection, path: &str) -> Result<bool, KeyringError>;
    fn read(&self, conn: Connection, path: &str) -> Result<Vec<u8>, KeyringError>;
    fn write(&self, conn: Connection, path: &str, data: &[u8]) -> Result<(), KeyringError>;
    fn delete(&self, conn: Connection, path: &str) -> Result<(), KeyringError>;
    fn mkdir(&self, conn: Connection) -> Result<(), KeyringError>;
    /// Best-effort visibility hint (e.g. `0700`/`0600` on POSIX
    /// filesystems). A backend that has no such concept is a no-op.
    fn set_visibility(&self, conn: Connection, path: &str, private: bool) -> Result<(), KeyringError>;

    /// Open a blob for streaming reads, for callers that would rather not
    /// buffer an entire large value through [`read`](Self::read). The
    /// default implementation buffers anyway (`read` then wraps the bytes
    /// in a cursor); backends that can open a real file handle or network
    /// stream should override this.
    fn open(&self, conn: Connection, path: &str) -> Result<Box<dyn Read + Send>, KeyringError> {
        let bytes = self.read(conn, path)?;
        Ok(Box::new(std::io::Cursor::new(bytes)))
    }

    /// Write a blob from a reader rather than an in-memory slice. The
    /// default implementation drains the reader into a `Vec<u8>` and calls
    /// [`write`](Self::write); backends that can stream straight to their
    /// underlying sink should override this.
    fn write_stream(&self, conn: Connection, path: &str, reader: &mut dyn Read) -> Result<(), KeyringError> {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| KeyringError::BlobStoreError(format!("read stream for {path}: {e}")))?;
        self.write(conn, path, &buf)
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// In-memory blob store (testing and ephemeral use).
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<(&'static str, String), Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn has(&self, conn: Connection, path: &str) -> Result<bool, KeyringError> {
        let blobs = self.blobs.read().unwrap();
        Ok(blobs.contains_key(&(conn.as_str(), path.to_string())))
    }

    fn read(&self, conn: Connection, path: &str) -> Result<Vec<u8>, KeyringError> {
        let blobs = self.blobs.read().unwrap();
        blobs
            .get(&(conn.as_str(), path.to_string()))
            .cloned()
            .ok_or_else(|| KeyringError::NotFound(format!("{}/{}", conn.as_str(), path)))
    }

    fn write(&self, conn: Connection, path: &str, data: &[u8]) -> Result<(), KeyringError> {
        let mut blobs = self.blobs.write().unwrap();
        blobs.insert((conn.as_str(), path.to_string()), data.to_vec());
        Ok(())
    }

    fn delete(&self, conn: Connection, path: &str) -> Result<(), KeyringError> {
        let mut blobs = self.blobs.write().unwrap();
        blobs.remove(&(conn.as_str(), path.to_string()));
        Ok(())
    }

    fn mkdir(&self, _conn: Connection) -> Result<(), KeyringError> {
        Ok(())
    }

    fn set_visibility(&self, _conn: Connection, _path: &str, _private: bool) -> Result<(), KeyringError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// Filesystem-backed blob store. Each [`Connection`] gets its own
/// subdirectory under `root`; writes are atomic (temp file + rename).
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn conn_dir(&self, conn: Connection) -> PathBuf {
        self.root.join(conn.as_str())
    }

    fn blob_path(&self, conn: Connection, path: &str) -> PathBuf {
        self.conn_dir(conn).join(path)
    }
}

impl BlobStore for FileBlobStore {
    fn has(&self, conn: Connection, path: &str) -> Result<bool, KeyringError> {
        Ok(self.blob_path(conn, path).exists())
    }

    fn read(&self, conn: Connection, path: &str) -> Result<Vec<u8>, KeyringError> {
        std::fs::read(self.blob_path(conn, path))
            .map_err(|e| KeyringError::BlobStoreError(format!("read {path}: {e}")))
    }

    fn write(&self, conn: Connection, path: &str, data: &[u8]) -> Result<(), KeyringError> {
        let dest = self.blob_path(conn, path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| KeyringError::BlobStoreError(format!("mkdir {parent:?}: {e}")))?;
        }
        let tmp = dest.with_extension("tmp");
        std::fs::write(&tmp, data)
            .map_err(|e| KeyringError::BlobStoreError(format!("write {path}: {e}")))?;
        std::fs::rename(&tmp, &dest)
            .map_err(|e| KeyringError::BlobStoreError(format!("rename {path}: {e}")))?;
        Ok(())
    }

    fn delete(&self, conn: Connection, path: &str) -> Result<(), KeyringError> {
        let dest = self.blob_path(conn, path);
        if dest.exists() {
            std::fs::remove_file(&dest)
                .map_err(|e| KeyringError::BlobStoreError(format!("delete {path}: {e}")))?;
        }
        Ok(())
    }

    fn mkdir(&self, conn: Connection) -> Result<(), KeyringError> {
        let dir = self.conn_dir(conn);
        std::fs::create_dir_all(&dir)
            .map_err(|e| KeyringError::BlobStoreError(format!("mkdir: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| KeyringError::BlobStoreError(format!("chmod {dir:?}: {e}")))?;
        }
        Ok(())
    }

    fn set_visibility(&self, conn: Connection, path: &str, private: bool) -> Result<(), KeyringError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let dest = self.blob_path(conn, path);
            let mode = if private { 0o600 } else { 0o644 };
            if dest.exists() {
                std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(mode))
                    .map_err(|e| KeyringError::BlobStoreError(format!("chmod {path}: {e}")))?;
            }
        }
        #[cfg(not(unix))]
        {
            let _ = (conn, path, private);
        }
        Ok(())
    }

    fn open(&self, conn: Connection, path: &str) -> Result<Box<dyn Read + Send>, KeyringError> {
        let file = std::fs::File::open(self.blob_path(conn, path))
            .map_err(|e| KeyringError::BlobStoreError(format!("open {path}: {e}")))?;
        Ok(Box::new(file))
    }

    fn write_stream(&self, conn: Connection, path: &str, reader: &mut dyn Read) -> Result<(), KeyringError> {
        let dest = self.blob_path(conn, path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| KeyringError::BlobStoreError(format!("mkdir {parent:?}: {e}")))?;
        }
        let tmp = dest.with_extension("tmp");
        {
            let mut tmp_file = std::fs::File::create(&tmp)
                .map_err(|e| KeyringError::BlobStoreError(format!("create {path}: {e}")))?;
            std::io::copy(reader, &mut tmp_file)
                .map_err(|e| KeyringError::BlobStoreError(format!("write stream {path}: {e}")))?;
        }
        std::fs::rename(&tmp, &dest)
            .map_err(|e| KeyringError::BlobStoreError(format!("rename {path}: {e}")))?;
        Ok(())
    }
}
