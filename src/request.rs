//! Fluent request objects for [`crate::facade::CryptoFacade`].
//!
//! The facade's message- and file-shaped operations share one options
//! record rather than each taking its own long parameter list.

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::CryptoError;
use crate::keys::KeyHandle;

/// Text/byte encoding applied to a ciphertext or signature on its way out
/// of the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Raw,
    Hex,
    Base64,
}

/// The payload shape a [`CryptoRequest`] carries.
pub enum Payload {
    /// An in-memory message.
    Message(crate::keys::SensitiveBytes),
    /// A file to read from and a file to write the result to. Only
    /// available with the `std` feature.
    #[cfg(feature = "std")]
    File {
        input: std::path::PathBuf,
        output: std::path::PathBuf,
    },
}

/// Options shared by every facade operation. Unused fields are simply left
/// at their defaults (`None`/`Encoding::Raw`) — the facade does not
/// validate that an option is "allowed" for a given op; it just ignores
/// options an op doesn't consume.
#[derive(Default)]
pub struct CryptoOptions {
    pub encoding: Option<Encoding>,
    /// Caller-supplied choice among multiple encoders for the same
    /// encoding family (reserved for future wire-format variants).
    pub choose_encoder: Option<String>,
    pub additional_data: Option<Vec<u8>>,
    pub mac_key: Option<KeyHandle>,
    pub signature_key: Option<KeyHandle>,
    pub version: Option<u8>,
    pub asymmetric_key: Option<KeyHandle>,
    /// The AES-256-GCM key [`CryptoFacade::encrypt`]/[`CryptoFacade::decrypt`]
    /// use for a [`Payload::Message`] request.
    ///
    /// [`CryptoFacade::encrypt`]: crate::facade::CryptoFacade::encrypt
    /// [`CryptoFacade::decrypt`]: crate::facade::CryptoFacade::decrypt
    pub symmetric_key: Option<KeyHandle>,
}

impl CryptoOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_additional_data(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.additional_data = Some(aad.into());
        self
    }

    pub fn with_mac_key(mut self, key: KeyHandle) -> Self {
        self.mac_key = Some(key);
        self
    }

    pub fn with_signature_key(mut self, key: KeyHandle) -> Self {
        self.signature_key = Some(key);
        self
    }

    pub fn with_asymmetric_key(mut self, key: KeyHandle) -> Self {
        self.asymmetric_key = Some(key);
        self
    }

    pub fn with_symmetric_key(mut self, key: KeyHandle) -> Self {
        self.symmetric_key = Some(key);
        self
    }
}

/// A single request to the facade: a payload shape plus its options.
pub struct CryptoRequest {
    pub payload: Payload,
    pub options: CryptoOptions,
}

impl CryptoRequest {
    pub fn message(bytes: impl Into<crate::keys::SensitiveBytes>) -> Self {
        Self {
            payload: Payload::Message(bytes.into()),
            options: CryptoOptions::new(),
        }
    }

    #[cfg(feature = "std")]
    pub fn file(input: impl Into<std::path::PathBuf>, output: impl Into<std::path::PathBuf>) -> Self {
        Self {
            payload: Payload::File {
                input: input.into(),
                output: output.into(),
            },
            options: CryptoOptions::new(),
        }
    }

    pub fn with_options(mut self, options: CryptoOptions) -> Self {
        self.options = options;
        self
    }

    /// The message bytes this request carries, for operations that only
    /// handle the `Message` payload shape (a `File` request is a
    /// `CryptoError::Encoding` there — callers wanting file support go
    /// through the facade's file-shaped operations directly).
    pub fn message_bytes(&self) -> Result<&[u8], CryptoError> {
        match &self.payload {
            Payload::Message(bytes) => Ok(bytes.as_slice()),
            #[cfg(feature = "std")]
            Payload::File { .. } => Err(CryptoError::Encoding),
        }
    }
}
