//! File-level seal and open operations.
//!
//! Sealing a file is two passes: a streaming hash pass to compute the
//! deterministic content salt, then the sequential pipeline writing through
//! a temp file that is atomically renamed into place. The output name is
//! the salt-derived secure name; the original name rides in the trailer.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::format::read_trailer;
use crate::hash::{HashAlg, hash_file};
use crate::kdf::content_salt_from_digest;
use crate::naming::{NAME_FIELD, parse_secure_file_name, secure_file_name};
use crate::sealing::{open_stream, open_stream_verified, seal_stream};
use crate::types::{SealOptions, VaultError};

/// Seal a file into `output_dir` (the input's directory by default).
///
/// The output file name is the hex salt plus the `svlt` extension; the
/// original file name is recorded in the trailer. When `tags_path` is
/// given, the per-block tag stream is written beside the sealed object so
/// it can later be opened in verified mode.
///
/// Returns the sealed file's path.
pub fn seal_file(
    input: &Path,
    output_dir: Option<&Path>,
    user_key: &[u8],
    opts: &SealOptions,
    tags_path: Option<&Path>,
) -> Result<PathBuf, VaultError> {
    let digest: [u8; 32] = hash_file(input, HashAlg::Sha256)?
        .try_into()
        .map_err(|_| VaultError::Crypto)?;
    let salt = content_salt_from_digest(digest, user_key)?;

    let mut fields = opts.fields.clone();
    if let Some(name) = input.file_name().and_then(|n| n.to_str()) {
        fields
            .entry(NAME_FIELD.to_string())
            .or_insert_with(|| name.to_string());
    }

    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;
    let out_path = dir.join(secure_file_name(&salt));

    let mut reader = BufReader::new(File::open(input)?);
    let mut tmp = NamedTempFile::new_in(&dir)?;
    let mut tag_buf = tags_path.map(|_| Vec::new());
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        seal_stream(
            &mut reader,
            &mut writer,
            user_key,
            &salt,
            fields,
            tag_buf.as_mut().map(|t| t as &mut dyn Write),
        )?;
        writer.flush()?;
    }
    tmp.as_file_mut().sync_all()?;
    let out_path = persist_tempfile_atomic(tmp, &out_path, opts.force)?;

    if let (Some(path), Some(tags)) = (tags_path, tag_buf) {
        write_all_atomic(path, &tags, opts.force)?;
    }
    Ok(out_path)
}

/// Open a sealed file.
///
/// The salt is recovered from the file name. The default output path is the
/// original name recorded in the trailer, next to the input; when the
/// trailer carries no name the `svlt` extension is replaced by `dec`. With
/// `tags_path` given, every block is verified against the captured tag
/// stream and opening fails closed on tampering.
///
/// Returns the plaintext file's path.
pub fn open_file(
    input: &Path,
    output: Option<&Path>,
    user_key: &[u8],
    force: bool,
    tags_path: Option<&Path>,
) -> Result<PathBuf, VaultError> {
    let salt = parse_secure_file_name(input)?;
    let mut reader = BufReader::new(File::open(input)?);

    let out_path = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let (meta, _) = read_trailer(&mut reader, user_key, None)?;
            let parent = input.parent().unwrap_or_else(|| Path::new("."));
            match meta.fields.get(NAME_FIELD) {
                Some(name) => parent.join(name),
                None => input.with_extension("dec"),
            }
        }
    };

    let parent = out_path
        .parent()
        .ok_or(VaultError::Invalid("output path has no parent"))?;
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        match tags_path {
            Some(path) => {
                let mut tags = BufReader::new(File::open(path)?);
                open_stream_verified(&mut reader, &mut writer, user_key, &salt, &mut tags)?;
            }
            None => {
                open_stream(&mut reader, &mut writer, user_key, &salt)?;
            }
        }
        writer.flush()?;
    }
    tmp.as_file_mut().sync_all()?;
    persist_tempfile_atomic(tmp, &out_path, force)
}

/// Atomically write data to a file using a temporary file.
pub fn write_all_atomic(path: &Path, data: &[u8], force: bool) -> Result<(), VaultError> {
    let parent = path
        .parent()
        .ok_or(VaultError::Invalid("output path has no parent"))?;
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    persist_tempfile_atomic(tmp, path, force)?;
    Ok(())
}

/// Atomically persist a tempfile to the target path, honoring the force
/// overwrite policy.
pub fn persist_tempfile_atomic(
    tmp: NamedTempFile,
    out: &Path,
    force: bool,
) -> Result<PathBuf, VaultError> {
    let tmp_path = tmp.into_temp_path();

    if out.exists() {
        if force {
            fs::remove_file(out)?;
        } else {
            return Err(VaultError::Invalid(
                "output exists; use --force to overwrite",
            ));
        }
    }

    tmp_path.persist(out).map_err(|e| VaultError::Io(e.error))?;
    Ok(out.to_path_buf())
}
