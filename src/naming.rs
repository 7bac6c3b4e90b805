//! Filename conventions for sealed objects.
//!
//! The salt is the object's identifier: it is carried as the (lower-case
//! hex) file stem so an object can be located and opened without re-reading
//! any plaintext. The original name travels inside the encrypted trailer
//! under the `"name"` field, so the on-disk name leaks nothing but the salt.

use std::path::Path;

use crate::hash::to_hex_lower;
use crate::types::{Salt, VaultError};

/// Extension carried by sealed files.
pub const SECURE_EXT: &str = "svlt";

/// Metadata field holding the original file name.
pub const NAME_FIELD: &str = "name";

/// File name for a sealed object: the hex-encoded salt plus [`SECURE_EXT`].
pub fn secure_file_name(salt: &Salt) -> String {
    format!("{}.{SECURE_EXT}", to_hex_lower(salt))
}

/// Recover the salt from a sealed file's name.
pub fn parse_secure_file_name(path: &Path) -> Result<Salt, VaultError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or(VaultError::Invalid("file name is not valid UTF-8"))?;
    if path.extension().and_then(|e| e.to_str()) != Some(SECURE_EXT) {
        return Err(VaultError::Invalid("not a sealed file name"));
    }
    let raw = hex::decode(stem).map_err(|_| VaultError::Invalid("file stem is not hex"))?;
    let salt: Salt = raw
        .try_into()
        .map_err(|_| VaultError::Invalid("file stem is not a 32-byte salt"))?;
    Ok(salt)
}
