//! File-level seal/open, salt-derived naming and the overwrite policy.

use std::fs;

use seekvault::{SealOptions, VaultError, open_file, seal_file, to_hex_lower};
use tempfile::tempdir;

#[test]
fn seal_then_open_by_default_name() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, b"some file content worth keeping").unwrap();

    let sealed = seal_file(&input, None, b"pw", &SealOptions::default(), None).unwrap();
    assert_eq!(sealed.extension().and_then(|e| e.to_str()), Some("svlt"));
    // the stem is the hex salt: 32 bytes, stable for this content+key
    assert_eq!(sealed.file_stem().unwrap().len(), 64);

    // the default output is the original name from the trailer; remove the
    // plaintext first so the restore does not collide with it
    fs::remove_file(&input).unwrap();
    let restored = open_file(&sealed, None, b"pw", false, None).unwrap();
    assert_eq!(restored, input);
    assert_eq!(fs::read(&input).unwrap(), b"some file content worth keeping");
}

#[test]
fn sealed_name_is_the_content_salt() {
    use seekvault::content_salt;

    let dir = tempdir().unwrap();
    let input = dir.path().join("a.bin");
    let data = vec![9u8; 10_000];
    fs::write(&input, &data).unwrap();

    let sealed = seal_file(&input, None, b"pw", &SealOptions::default(), None).unwrap();
    let expected = content_salt(&data, b"pw").unwrap();
    assert_eq!(
        sealed.file_stem().unwrap().to_str().unwrap(),
        to_hex_lower(&expected)
    );
}

#[test]
fn overwrite_needs_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("a.bin");
    fs::write(&input, b"stable content").unwrap();

    seal_file(&input, None, b"pw", &SealOptions::default(), None).unwrap();
    // same content + key -> same output name -> collision
    let again = seal_file(&input, None, b"pw", &SealOptions::default(), None);
    assert!(matches!(again, Err(VaultError::Invalid(_))));

    let forced = SealOptions {
        force: true,
        ..Default::default()
    };
    seal_file(&input, None, b"pw", &forced, None).unwrap();
}

#[test]
fn verified_open_with_tag_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("big.bin");
    let data: Vec<u8> = (0..100_000u32).map(|i| (i % 256) as u8).collect();
    fs::write(&input, &data).unwrap();
    let tags = dir.path().join("big.tags");

    let sealed = seal_file(&input, None, b"pw", &SealOptions::default(), Some(&tags)).unwrap();
    assert_eq!(fs::metadata(&tags).unwrap().len(), 4 * 16); // 4 blocks

    let out = dir.path().join("restored.bin");
    open_file(&sealed, Some(&out), b"pw", false, Some(&tags)).unwrap();
    assert_eq!(fs::read(&out).unwrap(), data);

    // flip one ciphertext byte: the verified path must fail closed
    let mut bytes = fs::read(&sealed).unwrap();
    bytes[40_000] ^= 0x01;
    fs::write(&sealed, &bytes).unwrap();
    let bad = open_file(&sealed, Some(&out), b"pw", true, Some(&tags));
    assert!(matches!(bad, Err(VaultError::Crypto)));
}

#[test]
fn explicit_output_directory() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().join("vault");
    let input = dir.path().join("doc.pdf");
    fs::write(&input, b"%PDF-1.7 ...").unwrap();

    let sealed = seal_file(&input, Some(&out_dir), b"pw", &SealOptions::default(), None).unwrap();
    assert_eq!(sealed.parent(), Some(out_dir.as_path()));

    let restored = open_file(&sealed, None, b"pw", false, None).unwrap();
    // the original name lands next to the sealed file
    assert_eq!(restored, out_dir.join("doc.pdf"));
    assert_eq!(fs::read(&restored).unwrap(), b"%PDF-1.7 ...");
}
