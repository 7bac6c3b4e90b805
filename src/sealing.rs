//! Whole-file encrypt/decrypt pipeline.
//!
//! The non-seeking counterpart to the secure streams: one sequential pass
//! over the content, same on-disk layout. During sealing each block's
//! 16-byte authentication tag can be captured into a side stream; opening
//! with that tag stream verifies every block and fails closed on the first
//! mismatch. Opening without it applies the raw keystream, like the
//! random-access path. Use the verified mode whenever the whole object is
//! consumed at once and tampering must be detected.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use getrandom::fill as getrandom;
use zeroize::Zeroize;

use crate::blocks::counter_bytes;
use crate::crypto::{apply_block_keystream, open_block_detached, seal_block_detached};
use crate::format::{META_BLOCK_LEN, Metadata, read_trailer, write_trailer};
use crate::kdf::{content_salt, derive_crypto_key, meta_key};
use crate::types::{BLOCK_LEN, PEPPER_LEN, Salt, SealOptions, TAG_LEN, VaultError};

/// A sealed object together with the salt identifying it.
///
/// The salt is not stored in the payload; keep it (typically as the file
/// name, see [`crate::secure_file_name`]), since it is required to open the
/// object again.
#[derive(Debug, Clone)]
pub struct SealedObject {
    pub bytes: Vec<u8>,
    pub salt: Salt,
}

/// Seal a reader into a writer, streaming block by block.
///
/// `salt` must be the deterministic content salt; callers that hold the
/// whole plaintext can use [`seal_bytes`] instead, which computes it. When
/// `tags` is given, every block's authentication tag is appended to it in
/// block order.
///
/// Returns the number of plaintext bytes sealed.
pub fn seal_stream<R, W>(
    input: &mut R,
    output: &mut W,
    user_key: &[u8],
    salt: &Salt,
    fields: std::collections::BTreeMap<String, String>,
    mut tags: Option<&mut dyn Write>,
) -> Result<u64, VaultError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut pepper = [0u8; PEPPER_LEN];
    getrandom(&mut pepper).map_err(|_| VaultError::Crypto)?;
    let mut key = derive_crypto_key(user_key, salt, &pepper)?;
    let meta_cipher_key = meta_key(user_key)?;

    let mut buf = vec![0u8; BLOCK_LEN];
    let mut original_len: u64 = 0;
    let mut block_no: u64 = 1;
    loop {
        let n = read_full(input, &mut buf)?;
        if n == 0 {
            break;
        }
        let tag = seal_block_detached(&key, &counter_bytes(block_no), &mut buf[..n])?;
        output.write_all(&buf[..n])?;
        if let Some(t) = tags.as_deref_mut() {
            t.write_all(&tag)?;
        }
        original_len += n as u64;
        block_no += 1;
        if n < BLOCK_LEN {
            break;
        }
    }
    key.zeroize();

    let meta = Metadata {
        fields,
        original_len,
        pepper,
    };
    write_trailer(output, &meta, &meta_cipher_key)?;
    Ok(original_len)
}

/// Open a sealed object sequentially without integrity checking.
///
/// Recovers the trailer, re-derives the content key and streams the
/// keystream-decrypted content to `output`. Returns the plaintext length.
pub fn open_stream<R, W>(
    input: &mut R,
    output: &mut W,
    user_key: &[u8],
    salt: &Salt,
) -> Result<u64, VaultError>
where
    R: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    let (meta, _) = read_trailer(input, user_key, None)?;
    let mut key = derive_crypto_key(user_key, salt, &meta.pepper)?;

    input.seek(SeekFrom::Start(0))?;
    let mut buf = vec![0u8; BLOCK_LEN];
    let mut remaining = meta.original_len;
    let mut block_no: u64 = 1;
    while remaining > 0 {
        let n = (BLOCK_LEN as u64).min(remaining) as usize;
        input.read_exact(&mut buf[..n])?;
        apply_block_keystream(&key, &counter_bytes(block_no), &mut buf[..n])?;
        output.write_all(&buf[..n])?;
        remaining -= n as u64;
        block_no += 1;
    }
    key.zeroize();
    output.flush()?;
    Ok(meta.original_len)
}

/// Open a sealed object sequentially, verifying every block against the
/// captured tag stream.
///
/// Fails closed: the first tag mismatch aborts with
/// [`VaultError::Crypto`] and nothing further is written. A tag stream
/// that is too short or too long for the block count is [`VaultError::Malformed`].
pub fn open_stream_verified<R, W, M>(
    input: &mut R,
    output: &mut W,
    user_key: &[u8],
    salt: &Salt,
    tags: &mut M,
) -> Result<u64, VaultError>
where
    R: Read + Seek + ?Sized,
    W: Write + ?Sized,
    M: Read + ?Sized,
{
    let (meta, _) = read_trailer(input, user_key, None)?;
    let mut key = derive_crypto_key(user_key, salt, &meta.pepper)?;

    input.seek(SeekFrom::Start(0))?;
    let mut buf = vec![0u8; BLOCK_LEN];
    let mut tag = [0u8; TAG_LEN];
    let mut remaining = meta.original_len;
    let mut block_no: u64 = 1;
    while remaining > 0 {
        let n = (BLOCK_LEN as u64).min(remaining) as usize;
        input.read_exact(&mut buf[..n])?;
        tags.read_exact(&mut tag)
            .map_err(|_| VaultError::Malformed)?;
        open_block_detached(&key, &counter_bytes(block_no), &mut buf[..n], &tag)?;
        output.write_all(&buf[..n])?;
        remaining -= n as u64;
        block_no += 1;
    }
    key.zeroize();
    // a longer tag stream means it does not belong to this object
    if tags.read(&mut tag[..1])? != 0 {
        return Err(VaultError::Malformed);
    }
    output.flush()?;
    Ok(meta.original_len)
}

/// Seal a byte slice, computing the content salt.
pub fn seal_bytes(
    plaintext: &[u8],
    user_key: &[u8],
    opts: &SealOptions,
) -> Result<SealedObject, VaultError> {
    let salt = content_salt(plaintext, user_key)?;
    let mut bytes = Vec::with_capacity(plaintext.len() + META_BLOCK_LEN);
    seal_stream(
        &mut &plaintext[..],
        &mut bytes,
        user_key,
        &salt,
        opts.fields.clone(),
        None,
    )?;
    Ok(SealedObject { bytes, salt })
}

/// Seal a byte slice and capture the per-block tag stream alongside.
pub fn seal_bytes_detached(
    plaintext: &[u8],
    user_key: &[u8],
    opts: &SealOptions,
) -> Result<(SealedObject, Vec<u8>), VaultError> {
    let salt = content_salt(plaintext, user_key)?;
    let mut bytes = Vec::with_capacity(plaintext.len() + META_BLOCK_LEN);
    let mut tags = Vec::new();
    seal_stream(
        &mut &plaintext[..],
        &mut bytes,
        user_key,
        &salt,
        opts.fields.clone(),
        Some(&mut tags),
    )?;
    Ok((SealedObject { bytes, salt }, tags))
}

/// Open a sealed byte slice without integrity checking.
pub fn open_bytes(data: &[u8], user_key: &[u8], salt: &Salt) -> Result<Vec<u8>, VaultError> {
    let mut input = Cursor::new(data);
    let mut out = Vec::new();
    open_stream(&mut input, &mut out, user_key, salt)?;
    Ok(out)
}

/// Open a sealed byte slice, verifying every block against `tags`.
pub fn open_bytes_verified(
    data: &[u8],
    user_key: &[u8],
    salt: &Salt,
    tags: &[u8],
) -> Result<Vec<u8>, VaultError> {
    let mut input = Cursor::new(data);
    let mut tag_stream = Cursor::new(tags);
    let mut out = Vec::new();
    open_stream_verified(&mut input, &mut out, user_key, salt, &mut tag_stream)?;
    Ok(out)
}

/// Read until the buffer is full or the reader is exhausted.
fn read_full<R: Read + ?Sized>(input: &mut R, buf: &mut [u8]) -> Result<usize, VaultError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
