//! Per-block AEAD primitives.
//!
//! Every block is an independent AES-256-GCM message keyed by the derived
//! crypto key with a nonce derived from the block number. The sequential
//! pipeline keeps each block's tag (verified on the way back); the seekable
//! stream discards tags and decrypts through the raw GCM keystream instead.

use aead::{AeadInPlace, KeyInit};
use aes::Aes256;
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use ctr::cipher::{KeyIvInit, StreamCipher};
use getrandom::fill as getrandom;

use crate::types::{KEY_LEN, NONCE_LEN, TAG_LEN, VaultError};

type Aes256Ctr32BE = ctr::Ctr32BE<Aes256>;

/// Encrypt one block in place, returning the detached authentication tag.
///
/// The caller decides the tag's fate: the sequential pipeline writes it to
/// the tag side-stream, the seekable stream drops it.
pub fn seal_block_detached(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    buf: &mut [u8],
) -> Result<[u8; TAG_LEN], VaultError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::Crypto)?;
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), &[], buf)
        .map_err(|_| VaultError::Crypto)?;
    Ok(tag.into())
}

/// Decrypt one block in place, verifying the detached tag.
///
/// # Errors
///
/// Returns `VaultError::Crypto` on tag mismatch; the block must be treated
/// as corrupt or the key as wrong.
pub fn open_block_detached(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    buf: &mut [u8],
    tag: &[u8; TAG_LEN],
) -> Result<(), VaultError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::Crypto)?;
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(nonce), &[], buf, Tag::from_slice(tag))
        .map_err(|_| VaultError::Crypto)
}

/// Apply the raw GCM keystream to a block, without authentication.
///
/// For a 96-bit nonce the GCM ciphertext body is AES-CTR starting at counter
/// block `nonce || 00 00 00 02` (32-bit big-endian counter), so applying that
/// keystream decrypts (or re-encrypts) a block bit-exactly with the tag
/// ignored. This is the random-access path: no integrity, no tag required.
pub fn apply_block_keystream(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    buf: &mut [u8],
) -> Result<(), VaultError> {
    let mut iv = [0u8; 16];
    iv[..NONCE_LEN].copy_from_slice(nonce);
    iv[15] = 2;
    let mut cipher = Aes256Ctr32BE::new(key.into(), &iv.into());
    cipher.apply_keystream(buf);
    Ok(())
}

/// Fill a buffer with cryptographically secure random bytes, none zero.
///
/// Padding regions use this so a padded file never contains runs the format
/// could be fingerprinted by; zero bytes are resampled until gone.
pub fn fill_nonzero(buf: &mut [u8]) -> Result<(), VaultError> {
    getrandom(buf).map_err(|_| VaultError::Crypto)?;
    loop {
        let zeros: Vec<usize> = buf
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| (b == 0).then_some(i))
            .collect();
        if zeros.is_empty() {
            return Ok(());
        }
        let mut fresh = vec![0u8; zeros.len()];
        getrandom(&mut fresh).map_err(|_| VaultError::Crypto)?;
        for (&i, &b) in zeros.iter().zip(fresh.iter()) {
            buf[i] = b;
        }
    }
}
