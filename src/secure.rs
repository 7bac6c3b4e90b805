//! Random-access encrypted streams.
//!
//! [`SecureStreamWriter`] and [`SecureStreamReader`] specialise the generic
//! block stream with the AES-256-GCM block transform. Per-block tags are
//! computed and discarded: a reader can decrypt any block from its number
//! alone, which is what makes seeking cheap, at the price of per-read
//! integrity. Tampering with ciphertext is *undetectable* in this mode by
//! design; use the sequential pipeline with a tag stream when the whole
//! object is consumed at once and tampering must be detected.

use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom, Write};

use getrandom::fill as getrandom;
use zeroize::Zeroize;

use crate::blocks::counter_bytes;
use crate::crypto::{apply_block_keystream, seal_block_detached};
use crate::format::{Metadata, read_trailer, write_trailer};
use crate::kdf::{derive_crypto_key, meta_key};
use crate::stream::{BlockStream, BlockTransform};
use crate::types::{BLOCK_LEN, KEY_LEN, PEPPER_LEN, Salt, VaultError};

/// AES-256-GCM block transform: encrypt with the tag discarded, decrypt
/// through the raw keystream.
pub(crate) struct GcmTransform {
    key: [u8; KEY_LEN],
}

impl GcmTransform {
    pub(crate) fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }
}

impl BlockTransform for GcmTransform {
    fn transform_write(&mut self, buf: &mut Vec<u8>, block_number: u64) -> Result<(), VaultError> {
        seal_block_detached(&self.key, &counter_bytes(block_number), buf)?;
        Ok(())
    }

    fn transform_read(&mut self, buf: &mut Vec<u8>, block_number: u64) -> Result<(), VaultError> {
        apply_block_keystream(&self.key, &counter_bytes(block_number), buf)
    }
}

impl Drop for GcmTransform {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Write role: encrypts content block-wise as it is written, then appends
/// the padding region and the encrypted metadata trailer at finalisation.
pub struct SecureStreamWriter<S> {
    stream: BlockStream<S, GcmTransform>,
    meta: Metadata,
    meta_cipher_key: [u8; KEY_LEN],
}

impl<S: Write + Seek> SecureStreamWriter<S> {
    /// Start writing a sealed object.
    ///
    /// Generates a fresh pepper and derives the content key from
    /// `(user_key, salt, pepper)`. The salt must be the deterministic
    /// content salt (see [`crate::content_salt`]); it is the caller's
    /// identifier for the object and is not stored in the payload.
    pub fn new(
        inner: S,
        user_key: &[u8],
        salt: &Salt,
        fields: BTreeMap<String, String>,
    ) -> Result<Self, VaultError> {
        let mut pepper = [0u8; PEPPER_LEN];
        getrandom(&mut pepper).map_err(|_| VaultError::Crypto)?;
        let key = derive_crypto_key(user_key, salt, &pepper)?;
        Ok(Self {
            stream: BlockStream::new(inner, GcmTransform::new(key), BLOCK_LEN)?,
            meta: Metadata {
                fields,
                original_len: 0,
                pepper,
            },
            meta_cipher_key: meta_key(user_key)?,
        })
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize, VaultError> {
        self.stream.write(buf)
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, VaultError> {
        self.stream.seek(pos)
    }

    pub fn flush_cache(&mut self) -> Result<(), VaultError> {
        self.stream.flush_cache()
    }

    pub fn set_cache_trailer(&mut self, on: bool) -> Result<(), VaultError> {
        self.stream.set_cache_trailer(on)
    }

    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Plaintext bytes written so far.
    pub fn len(&self) -> u64 {
        self.stream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    pub fn block_number(&self) -> u64 {
        self.stream.block_number()
    }

    /// Finalise the object: flush content, then append the non-zero random
    /// padding and the encrypted metadata trailer. Consumes the writer and
    /// returns the underlying stream.
    ///
    /// Skipping this before dropping leaves a truncated, non-interoperable
    /// file.
    pub fn finalise(mut self) -> Result<S, VaultError> {
        self.stream.finalise_write()?;
        let original_len = self.stream.len();
        self.meta.original_len = original_len;

        let inner = self.stream.inner_mut();
        inner.seek(SeekFrom::Start(original_len))?;
        write_trailer(inner, &self.meta, &self.meta_cipher_key)?;

        self.meta_cipher_key.zeroize();
        Ok(self.stream.into_inner())
    }
}

/// Read role: recovers the metadata trailer, re-derives the content key and
/// serves arbitrary byte ranges without touching the rest of the object.
///
/// Implements [`std::io::Read`] and [`std::io::Seek`], so it drops into any
/// consumer that streams from a file (e.g. a media player source).
pub struct SecureStreamReader<S> {
    stream: BlockStream<S, GcmTransform>,
    meta: Metadata,
}

impl<S: Read + Seek> SecureStreamReader<S> {
    /// Open a sealed object, choosing the trailer width by heuristic.
    pub fn open(inner: S, user_key: &[u8], salt: &Salt) -> Result<Self, VaultError> {
        Self::open_inner(inner, user_key, salt, None)
    }

    /// Open a sealed object whose trailer width is known out of band.
    pub fn open_with_width(
        inner: S,
        user_key: &[u8],
        salt: &Salt,
        width: usize,
    ) -> Result<Self, VaultError> {
        Self::open_inner(inner, user_key, salt, Some(width))
    }

    fn open_inner(
        mut inner: S,
        user_key: &[u8],
        salt: &Salt,
        width: Option<usize>,
    ) -> Result<Self, VaultError> {
        let (meta, _) = read_trailer(&mut inner, user_key, width)?;
        let key = derive_crypto_key(user_key, salt, &meta.pepper)?;
        Ok(Self {
            stream: BlockStream::new(inner, GcmTransform::new(key), BLOCK_LEN)?
                .with_length(meta.original_len),
            meta,
        })
    }

    /// Original plaintext length, not the padded on-disk size.
    pub fn len(&self) -> u64 {
        self.stream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    pub fn block_number(&self) -> u64 {
        self.stream.block_number()
    }

    /// Caller metadata recovered from the trailer.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.meta.fields
    }

    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

impl<S: Read + Seek> Read for SecureStreamReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf).map_err(Into::into)
    }
}

impl<S: Read + Seek> Seek for SecureStreamReader<S> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.stream.seek(pos).map_err(Into::into)
    }
}
