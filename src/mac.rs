//! Keyed BLAKE2b-512: the `authenticate`/`checksum` primitive.
//!
//! Both operations are the same keyed MAC; `checksum` is just the name the
//! keyring integrity engine uses when MACing its own serialized state.

use blake2::digest::{FixedOutput, KeyInit, Update};
use blake2::Blake2bMac512;

use crate::error::EncodingError;

/// Output size of keyed BLAKE2b-512, in bytes.
pub const MAC_BYTES: usize = 64;

/// Compute the keyed BLAKE2b-512 MAC of `message` under `key`.
pub fn mac(key: &[u8], message: &[u8]) -> Result<[u8; MAC_BYTES], EncodingError> {
    let mut hasher = Blake2bMac512::new_from_slice(key).map_err(|_| EncodingError)?;
    Update::update(&mut hasher, message);
    let out = hasher.finalize_fixed();
    let mut buf = [0u8; MAC_BYTES];
    buf.copy_from_slice(&out);
    Ok(buf)
}

/// Verify a keyed BLAKE2b-512 MAC in constant time.
pub fn verify(key: &[u8], message: &[u8], tag: &[u8; MAC_BYTES]) -> bool {
    use subtle::ConstantTimeEq;
    match mac(key, message) {
        Ok(computed) => computed.ct_eq(tag).into(),
        Err(_) => false,
    }
}

/// Streaming variant used by the keyring integrity engine's checksum, which
/// MACs arbitrary-length serialized keyring state rather than a single
/// in-memory buffer.
pub struct MacWriter {
    hasher: Blake2bMac512,
}

impl MacWriter {
    pub fn new(key: &[u8]) -> Result<Self, EncodingError> {
        Ok(Self {
            hasher: Blake2bMac512::new_from_slice(key).map_err(|_| EncodingError)?,
        })
    }

    pub fn update(&mut self, chunk: &[u8]) {
        Update::update(&mut self.hasher, chunk);
    }

    pub fn finalize(self) -> [u8; MAC_BYTES] {
        let out = self.hasher.finalize_fixed();
        let mut buf = [0u8; MAC_BYTES];
        buf.copy_from_slice(&out);
        buf
    }
}

#[cfg(feature = "std")]
impl std::io::Write for MacWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
