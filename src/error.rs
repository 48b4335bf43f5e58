//! Unified error types for the crypto facade.

extern crate alloc;
use alloc::string::String;
use core::fmt;

/// Oracle-safe decryption/verification failure. Carries no detail about
/// *why* a ciphertext, MAC, or signature was rejected — every failure
/// path produces this same shape so a caller cannot distinguish "bad key"
/// from "bad tag" from "truncated input".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionError;

impl fmt::Display for DecryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decryption failed")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecryptionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingError;

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding error")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodingError {}

/// Normalize encode errors into decrypt errors (oracle discipline).
impl From<EncodingError> for DecryptionError {
    fn from(_: EncodingError) -> Self {
        DecryptionError
    }
}

/// Facade-level error. Every op returns this (or a type convertible to it)
/// rather than leaking the underlying primitive's own error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The request named a key tag the operation cannot use with the key
    /// handle actually supplied.
    WrongKeyType { expected: String, found: String },
    /// The request's option set did not supply a key the operation
    /// requires (e.g. `encrypt_message` with no symmetric key attached).
    MissingRequiredKey,
    /// The underlying primitive (AEAD, KEM, Argon2, etc.) failed.
    BackendFailure,
    /// A key blob, request, or wire value was malformed.
    Encoding,
    /// Decryption, MAC verification, or signature verification failed.
    /// Oracle-safe: never distinguishes the cause.
    Decryption,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongKeyType { expected, found } => {
                write!(f, "wrong key type: expected {expected}, found {found}")
            }
            Self::MissingRequiredKey => write!(f, "request is missing a required key"),
            Self::BackendFailure => write!(f, "cryptographic backend failure"),
            Self::Encoding => write!(f, "encoding error"),
            Self::Decryption => write!(f, "decryption failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CryptoError {}

impl From<EncodingError> for CryptoError {
    fn from(_: EncodingError) -> Self {
        Self::Encoding
    }
}

impl From<DecryptionError> for CryptoError {
    fn from(_: DecryptionError) -> Self {
        Self::Decryption
    }
}
