//! Core types, constants and the error enum for seekvault.

use std::collections::BTreeMap;
use thiserror::Error;

/// Fixed plaintext block length of the container format (32 KiB).
///
/// Every content block except possibly the last holds exactly this many
/// bytes; the per-block nonce is derived from the 1-indexed block number.
pub const BLOCK_LEN: usize = 32 * 1024;

/// Salt length in bytes (deterministic per content + key).
pub const SALT_LEN: usize = 32;

/// Pepper length in bytes (fresh random per encryption).
pub const PEPPER_LEN: usize = 32;

/// Symmetric key length in bytes (SHA-256 output).
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Deterministic 32-byte content identifier, recoverable from the file name.
pub type Salt = [u8; SALT_LEN];

/// Options for sealing content.
#[derive(Debug, Clone, Default)]
pub struct SealOptions {
    /// Caller metadata carried in the encrypted trailer (e.g. the original
    /// file name). An empty map selects the compact trailer width.
    pub fields: BTreeMap<String, String>,
    /// When `true`, allow overwriting existing output file paths.
    pub force: bool,
}

impl SealOptions {
    /// Add a metadata field in a builder-friendly way.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Library error type (no panics for expected failures).
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("encryption/decryption failure")]
    Crypto,
    #[error("malformed or undecryptable metadata block")]
    Malformed,
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Writing into a block whose bytes were already committed.
    #[error("unable to write dirty block {0}")]
    DirtyBlock(u64),
    /// Seeking away from an incompletely filled, non-rewritable block.
    #[error("unable to abandon block {0}")]
    AbandonBlock(u64),
    /// Trailer bytes cached by the caller do not cover the reserved span.
    #[error("trailer cached {cached} bytes but {reserved} were reserved")]
    TrailerMismatch { reserved: u64, cached: u64 },
    #[error("stream already finalised")]
    Finalised,
    #[error("serialization error")]
    Cbor(#[from] ciborium::ser::Error<std::io::Error>),
}

impl From<VaultError> for std::io::Error {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::Io(io) => io,
            other => std::io::Error::other(other),
        }
    }
}
