#![forbid(unsafe_code)]
//! # seekvault — seekable authenticated encryption for files.
//!
//! `seekvault` is a Rust library for a block-based encrypted container
//! format with two access patterns over the same bytes at rest:
//!
//! - **Sequential, verified**: seal and open a whole object in one pass,
//!   optionally capturing a per-block authentication tag stream so every
//!   block is verified on the way back (tampering fails closed).
//! - **Random access**: open the object as a seekable stream and decrypt
//!   only the byte ranges actually requested (e.g. media seeking). Blocks
//!   are independently decryptable from their block number; tags are
//!   discarded in this mode, trading per-read integrity for seekability.
//!
//! ## Features
//! - **AES-256-GCM per block** with counter-derived nonces
//! - **Deterministic salt** identifying content+key, carried in the file
//!   name rather than the payload
//! - **Fresh pepper per encryption**: same content, same key, different
//!   ciphertext every time
//! - **Size-hiding padding**: the on-disk size reveals only a coarse bound
//!   on the plaintext length
//! - **Encrypted metadata trailer** for caller key/value fields
//! - **Order-independent key combination** over sets of digests
//!
//! ## Example: seal and open a byte array
//! ```
//! use seekvault::{seal_bytes, open_bytes, SealOptions};
//!
//! let sealed = seal_bytes(b"Hello, world!", b"my key", &SealOptions::default()).unwrap();
//! let plaintext = open_bytes(&sealed.bytes, b"my key", &sealed.salt).unwrap();
//! assert_eq!(plaintext, b"Hello, world!");
//! ```
//!
//! ## Example: random access
//! ```
//! use std::io::{Cursor, Read, Seek, SeekFrom};
//! use seekvault::{seal_bytes, SealOptions, SecureStreamReader};
//!
//! let sealed = seal_bytes(&vec![7u8; 100_000], b"my key", &SealOptions::default()).unwrap();
//! let mut reader =
//!     SecureStreamReader::open(Cursor::new(sealed.bytes), b"my key", &sealed.salt).unwrap();
//! reader.seek(SeekFrom::Start(90_000)).unwrap();
//! let mut window = [0u8; 16];
//! reader.read_exact(&mut window).unwrap();
//! assert_eq!(window, [7u8; 16]);
//! ```
//!
//! Safety notes
//! - Keys are supplied pre-formed; there is no password hardening here.
//! - The random-access mode does not authenticate reads. Tampered blocks
//!   decrypt to garbage silently; use the verified pipeline when that
//!   matters.

mod blocks;
mod crypto;
mod file;
mod format;
mod hash;
mod kdf;
mod naming;
mod sealing;
mod secure;
mod stream;
mod types;

// Re-export public API from modules
pub use blocks::{BlockPosition, block_position, counter_bytes, pad_size};
pub use file::{open_file, seal_file, write_all_atomic};
pub use format::{META_BLOCK_LEN, META_BLOCK_LEN_COMPACT, Metadata};
pub use hash::{HashAlg, hash_bytes, hash_file, to_hex_lower};
pub use kdf::{content_salt, content_salt_from_digest, derive_crypto_key, derive_key, meta_key};
pub use naming::{NAME_FIELD, SECURE_EXT, parse_secure_file_name, secure_file_name};
pub use sealing::{
    SealedObject, open_bytes, open_bytes_verified, open_stream, open_stream_verified, seal_bytes,
    seal_bytes_detached, seal_stream,
};
pub use secure::{SecureStreamReader, SecureStreamWriter};
pub use stream::{BlockStream, BlockTransform};
pub use types::{BLOCK_LEN, KEY_LEN, NONCE_LEN, PEPPER_LEN, SALT_LEN, Salt, SealOptions, TAG_LEN, VaultError};
