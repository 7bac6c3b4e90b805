//! Metadata trailer structures and constants.
//!
//! The trailer is a fixed-width encrypted record at the tail of every sealed
//! object. It is keyed by `sha256(userKey)` alone, so a reader can recover
//! the pepper and original length before the content key chain is resolved.

use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom, Write};

use serde::{Deserialize, Serialize};

use crate::blocks::{counter_bytes, pad_size};
use crate::crypto::{apply_block_keystream, fill_nonzero, seal_block_detached};
use crate::kdf::meta_key;
use crate::types::{KEY_LEN, PEPPER_LEN, VaultError};

/// Trailer width when caller metadata fields are present.
pub const META_BLOCK_LEN: usize = 4096;

/// Trailer width for objects sealed without caller metadata.
pub const META_BLOCK_LEN_COMPACT: usize = 1024;

/// Reserved block number whose nonce encrypts the trailer.
///
/// Content block 1 uses the same nonce under the *content* key; the trailer
/// uses it under the meta key, so no (key, nonce) pair repeats.
pub const META_NONCE_BLOCK: u64 = 1;

/// Pad byte filling the trailer after the encoded record.
const META_PAD_BYTE: u8 = b' ';

/// Decrypted trailer contents.
///
/// An explicit tagged structure rather than an encoded key/value string, so
/// caller fields can never collide with the reserved ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Arbitrary caller key/value strings (e.g. the original file name).
    pub fields: BTreeMap<String, String>,
    /// Exact plaintext length, independent of padding.
    pub original_len: u64,
    /// Per-encryption pepper, required to re-derive the content key.
    pub pepper: [u8; PEPPER_LEN],
}

impl Metadata {
    /// Trailer width this record is written at.
    pub fn block_len(&self) -> usize {
        if self.fields.is_empty() {
            META_BLOCK_LEN_COMPACT
        } else {
            META_BLOCK_LEN
        }
    }
}

/// CBOR-encode a metadata record and right-pad it to the trailer width.
pub fn encode_metadata(meta: &Metadata, width: usize) -> Result<Vec<u8>, VaultError> {
    let mut buf = Vec::with_capacity(width);
    ciborium::ser::into_writer(meta, &mut buf)?;
    if buf.len() > width {
        return Err(VaultError::Invalid("metadata does not fit the trailer"));
    }
    buf.resize(width, META_PAD_BYTE);
    Ok(buf)
}

/// Decode a decrypted trailer block. Trailing pad bytes are ignored.
pub fn decode_metadata(block: &[u8]) -> Result<Metadata, VaultError> {
    ciborium::de::from_reader(block).map_err(|_| VaultError::Malformed)
}

/// Recover the metadata record from the tail of a sealed object.
///
/// `tail` holds the last `min(file_len, META_BLOCK_LEN)` bytes. With no
/// explicit `width` hint the wide trailer is tried first and the compact
/// width on decode failure; a wrong-width decrypt yields keystream noise
/// that cannot parse as the record, so the fallback is deterministic.
///
/// Returns the record and the width it was found at.
pub fn recover_metadata(
    tail: &[u8],
    user_key: &[u8],
    width: Option<usize>,
) -> Result<(Metadata, usize), VaultError> {
    let key = meta_key(user_key)?;
    let nonce = counter_bytes(META_NONCE_BLOCK);

    let candidates = match width {
        Some(w) => vec![w],
        None => vec![META_BLOCK_LEN, META_BLOCK_LEN_COMPACT],
    };

    for w in candidates {
        if tail.len() < w {
            continue;
        }
        let mut block = tail[tail.len() - w..].to_vec();
        apply_block_keystream(&key, &nonce, &mut block)?;
        if let Ok(meta) = decode_metadata(&block) {
            return Ok((meta, w));
        }
    }
    Err(VaultError::Malformed)
}

/// Append the padding region and the encrypted metadata trailer.
///
/// The writer must be positioned at the end of the content region
/// (`meta.original_len`). Padding is non-zero random filler bringing the
/// total to `pad_size(original_len, width)`.
pub(crate) fn write_trailer<W: Write + ?Sized>(
    output: &mut W,
    meta: &Metadata,
    meta_cipher_key: &[u8; KEY_LEN],
) -> Result<(), VaultError> {
    let width = meta.block_len();
    let total = pad_size(meta.original_len, width as u64);
    let mut padding = (total - meta.original_len - width as u64) as usize;

    let mut chunk = [0u8; 4096];
    while padding > 0 {
        let n = padding.min(chunk.len());
        fill_nonzero(&mut chunk[..n])?;
        output.write_all(&chunk[..n])?;
        padding -= n;
    }

    let mut block = encode_metadata(meta, width)?;
    seal_block_detached(meta_cipher_key, &counter_bytes(META_NONCE_BLOCK), &mut block)?;
    output.write_all(&block)?;
    output.flush()?;
    Ok(())
}

/// Seek to the tail of a sealed object and recover its metadata trailer.
///
/// Also cross-checks that the on-disk size equals
/// `pad_size(original_len, width)`; any other size means the object is
/// truncated, extended or not this format at all.
pub(crate) fn read_trailer<S: Read + Seek + ?Sized>(
    inner: &mut S,
    user_key: &[u8],
    width: Option<usize>,
) -> Result<(Metadata, usize), VaultError> {
    let file_len = inner.seek(SeekFrom::End(0))?;
    let tail_len = file_len.min(META_BLOCK_LEN as u64);
    let mut tail = vec![0u8; tail_len as usize];
    inner.seek(SeekFrom::Start(file_len - tail_len))?;
    inner.read_exact(&mut tail)?;

    let (meta, width) = recover_metadata(&tail, user_key, width)?;
    if pad_size(meta.original_len, width as u64) != file_len {
        return Err(VaultError::Malformed);
    }
    Ok((meta, width))
}
