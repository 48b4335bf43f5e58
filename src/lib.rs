//! # vaultcrypt
//!
//! Crypto facade for a secrets keyring: key handles, AEAD, keyed-BLAKE2b
//! MAC/checksum, Ed25519 signatures, and a hybrid post-quantum sealed box,
//! behind one small set of operations dispatched by key type rather than
//! reflection.
//!
//! ## Quick start
//!
//! ```rust
//! use vaultcrypt::CryptoFacade;
//!
//! let facade = CryptoFacade::new();
//! let (pk, sk) = facade.generate_asymmetric_encryption_keypair();
//!
//! let ciphertext = facade.seal(&pk, b"secret").unwrap();
//! let plaintext = facade.unseal(&sk, &ciphertext).unwrap();
//!
//! assert_eq!(plaintext, b"secret");
//! ```
//!
//! ## Security properties
//!
//! - **Hybrid KEM**: X25519 + ML-KEM-768 — secure if either holds
//! - **Uniform decryption errors**: all failures produce the same opaque
//!   `CryptoError::Decryption`, never a distinguishable cause
//! - **Key-type discipline**: every operation rejects a key handle whose
//!   tag doesn't match what it needs, via a total match, not reflection
//!
//! ## What's NOT provided
//!
//! - Keyring persistence, vault layout, or master-key sourcing — see the
//!   `keyring` crate in this workspace
//! - Streaming encryption
//! - FIPS certification

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/vaultcrypt/0.1.0")]

extern crate alloc;

mod aead;
pub mod error;
mod kdf;
mod kem;
mod mac;
mod signature;
mod wire;

pub mod facade;
pub mod keys;
pub mod request;

pub use error::CryptoError;
pub use facade::CryptoFacade;
pub use kdf::SecurityLevel;
pub use keys::{KeyHandle, KeyKind, SensitiveBytes, ADAPTER_TAG};
pub use mac::MAC_BYTES;
pub use request::{CryptoOptions, CryptoRequest, Encoding, Payload};
pub use signature::{SIGNATURE_BYTES, SIGNATURE_PUBLIC_KEY_BYTES, SIGNATURE_SECRET_KEY_BYTES};

/// Wire-format constants for the sealed-box ciphertext produced by
/// [`CryptoFacade::seal`]. Not part of the stable API; exposed for the
/// keyring crate's inspection/debugging tools.
#[doc(hidden)]
pub mod wire_format {
    pub use crate::wire::{MIN_CIPHERTEXT_BYTES, PROTOCOL_VERSION};
}

#[doc(hidden)]
pub use kem::{HybridX25519MlKem768Provider, KemProvider, MlKem768Provider, PublicKey, SecretKey};
