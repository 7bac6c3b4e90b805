//! Key derivation for the container format.
//!
//! Three derivations feed the format, all built on SHA-256:
//!
//! - the deterministic content **salt**, stable per (content, key) pair and
//!   carried in the object's identifier rather than its payload;
//! - the **crypto key** encrypting content blocks, which additionally folds
//!   in the per-encryption pepper so repeated encryptions of the same
//!   content never reuse a keystream;
//! - the content-independent **meta key** (`sha256(userKey)`) protecting the
//!   trailer, decryptable before the salt/pepper chain is resolved.
//!
//! [`derive_key`] is the order-independent combination of an arbitrary set
//! of digests into one key, for callers that address groups of objects.
//!
//! Keys arrive pre-formed; there is deliberately no password hardening here.

use base64::{Engine, engine::general_purpose};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::hash::to_hex_lower;
use crate::types::{KEY_LEN, PEPPER_LEN, SALT_LEN, Salt, VaultError};

/// Deterministic salt for a (content, key) pair.
///
/// Equals `sha256(mix(sha256(plaintext)) || userKey)` where `mix` reverses
/// bytes `[0,8)`, then bytes `[5,32)`, then the whole digest. The same
/// content under the same key always yields the same salt, so the salt can
/// identify the encrypted object without re-reading the plaintext.
pub fn content_salt(plaintext: &[u8], user_key: &[u8]) -> Result<Salt, VaultError> {
    let digest: [u8; SALT_LEN] = Sha256::digest(plaintext).into();
    content_salt_from_digest(digest, user_key)
}

/// [`content_salt`] for a pre-computed SHA-256 digest of the plaintext,
/// allowing the hash pass to stream over a file.
pub fn content_salt_from_digest(digest: [u8; 32], user_key: &[u8]) -> Result<Salt, VaultError> {
    if user_key.is_empty() {
        return Err(VaultError::Invalid("key must not be empty"));
    }
    let mut mixed = Zeroizing::new(digest);
    mixed[0..8].reverse();
    mixed[5..].reverse();
    mixed.reverse();

    let mut h = Sha256::new();
    h.update(&mixed[..]);
    h.update(user_key);
    Ok(h.finalize().into())
}

/// Derive the symmetric key used for content blocks:
/// `sha256(pepper || userKey || reverse(salt))`.
///
/// Never persisted; the reader recomputes it from the salt (known from the
/// identifier), the pepper (recovered from the trailer) and the user key.
pub fn derive_crypto_key(
    user_key: &[u8],
    salt: &Salt,
    pepper: &[u8; PEPPER_LEN],
) -> Result<[u8; KEY_LEN], VaultError> {
    if user_key.is_empty() {
        return Err(VaultError::Invalid("key must not be empty"));
    }
    let mut reversed = Zeroizing::new(*salt);
    reversed.reverse();

    let mut h = Sha256::new();
    h.update(pepper);
    h.update(user_key);
    h.update(&reversed[..]);
    Ok(h.finalize().into())
}

/// Content-independent key for the metadata trailer: `sha256(userKey)`.
pub fn meta_key(user_key: &[u8]) -> Result<[u8; KEY_LEN], VaultError> {
    if user_key.is_empty() {
        return Err(VaultError::Invalid("key must not be empty"));
    }
    Ok(Sha256::digest(user_key).into())
}

/// Combine an arbitrary set of digests into one key, independent of input
/// order.
///
/// Each digest is hex-encoded; the encodings are sorted lexicographically
/// (this is what removes the order dependence) and folded into the seed one
/// at a time via `seed = base64(sha256(utf8(hex || seed)))`. The result is
/// `sha256(utf8(seed))` after the fold.
pub fn derive_key<H: AsRef<[u8]>>(seed: &str, hashes: &[H]) -> [u8; KEY_LEN] {
    let mut encoded: Vec<String> = hashes.iter().map(|h| to_hex_lower(h.as_ref())).collect();
    encoded.sort();

    let mut seed = seed.to_owned();
    for hex in &encoded {
        let digest = Sha256::digest(format!("{hex}{seed}").as_bytes());
        seed = general_purpose::STANDARD.encode(digest);
    }
    Sha256::digest(seed.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_is_deterministic_and_key_bound() {
        let a = content_salt(b"content", b"key-1").unwrap();
        let b = content_salt(b"content", b"key-1").unwrap();
        let c = content_salt(b"content", b"key-2").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_key_rejected_everywhere() {
        assert!(matches!(
            content_salt(b"x", b""),
            Err(VaultError::Invalid(_))
        ));
        assert!(matches!(
            derive_crypto_key(b"", &[0u8; 32], &[0u8; 32]),
            Err(VaultError::Invalid(_))
        ));
        assert!(matches!(meta_key(b""), Err(VaultError::Invalid(_))));
    }

    #[test]
    fn derive_key_order_independent() {
        let h1 = [0x11u8; 32];
        let h2 = [0xEEu8; 32];
        let h3 = [0x42u8; 16];
        assert_eq!(derive_key("seed", &[h1, h2]), derive_key("seed", &[h2, h1]));
        assert_eq!(
            derive_key("seed", &[&h1[..], &h2[..], &h3[..]]),
            derive_key("seed", &[&h3[..], &h1[..], &h2[..]])
        );
    }

    #[test]
    fn derive_key_seed_sensitive() {
        let h = [0xA5u8; 32];
        assert_ne!(derive_key("seed-a", &[h]), derive_key("seed-b", &[h]));
    }
}
