//! Sequential round trips through the whole-file pipeline.

use seekvault::{
    BLOCK_LEN, META_BLOCK_LEN, META_BLOCK_LEN_COMPACT, SealOptions, open_bytes,
    open_bytes_verified, pad_size, seal_bytes, seal_bytes_detached,
};

fn pattern(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(2654435761).to_le_bytes()[0])
        .collect()
}

#[test]
fn empty_plaintext_round_trip() {
    let sealed = seal_bytes(&[], b"pw", &SealOptions::default()).unwrap();
    let pt = open_bytes(&sealed.bytes, b"pw", &sealed.salt).unwrap();
    assert!(pt.is_empty());
}

#[test]
fn tiny_plaintext_round_trip() {
    let sealed = seal_bytes(b"x", b"pw", &SealOptions::default()).unwrap();
    let pt = open_bytes(&sealed.bytes, b"pw", &sealed.salt).unwrap();
    assert_eq!(pt, b"x");
}

#[test]
fn block_boundary_sizes_round_trip() {
    for len in [
        BLOCK_LEN - 1,
        BLOCK_LEN,
        BLOCK_LEN + 1,
        3 * BLOCK_LEN,
        3 * BLOCK_LEN + 17,
    ] {
        let data = pattern(len);
        let sealed = seal_bytes(&data, b"pw", &SealOptions::default()).unwrap();
        let pt = open_bytes(&sealed.bytes, b"pw", &sealed.salt).unwrap();
        assert_eq!(pt, data, "len={len}");
    }
}

#[test]
fn verified_round_trip_multi_block() {
    let data = pattern(2 * BLOCK_LEN + 5);
    let (sealed, tags) = seal_bytes_detached(&data, b"pw", &SealOptions::default()).unwrap();
    assert_eq!(tags.len(), 3 * 16);
    let pt = open_bytes_verified(&sealed.bytes, b"pw", &sealed.salt, &tags).unwrap();
    assert_eq!(pt, data);
}

#[test]
fn metadata_fields_round_trip() {
    use seekvault::SecureStreamReader;
    use std::io::Cursor;

    let opts = SealOptions::default()
        .with_field("name", "holiday.mkv")
        .with_field("mime", "video/x-matroska");
    let sealed = seal_bytes(b"movie bits", b"pw", &opts).unwrap();

    let reader = SecureStreamReader::open(Cursor::new(sealed.bytes), b"pw", &sealed.salt).unwrap();
    assert_eq!(
        reader.metadata().get("name").map(String::as_str),
        Some("holiday.mkv")
    );
    assert_eq!(
        reader.metadata().get("mime").map(String::as_str),
        Some("video/x-matroska")
    );
}

#[test]
fn trailer_width_follows_fields() {
    let bare = seal_bytes(&pattern(100), b"pw", &SealOptions::default()).unwrap();
    assert_eq!(
        bare.bytes.len() as u64,
        pad_size(100, META_BLOCK_LEN_COMPACT as u64)
    );

    let opts = SealOptions::default().with_field("name", "a");
    let tagged = seal_bytes(&pattern(100), b"pw", &opts).unwrap();
    assert_eq!(
        tagged.bytes.len() as u64,
        pad_size(100, META_BLOCK_LEN as u64)
    );
}

#[test]
fn compact_width_heuristic_on_large_files() {
    // larger than the wide trailer, but sealed without fields: the reader
    // must fall back from the 4096 probe to the compact width
    let data = pattern(10_000);
    let sealed = seal_bytes(&data, b"pw", &SealOptions::default()).unwrap();
    assert!(sealed.bytes.len() > META_BLOCK_LEN);
    let pt = open_bytes(&sealed.bytes, b"pw", &sealed.salt).unwrap();
    assert_eq!(pt, data);
}

#[test]
fn truncated_object_is_malformed() {
    use seekvault::VaultError;

    let sealed = seal_bytes(&pattern(5000), b"pw", &SealOptions::default()).unwrap();
    let truncated = &sealed.bytes[..sealed.bytes.len() - 1];
    assert!(matches!(
        open_bytes(truncated, b"pw", &sealed.salt),
        Err(VaultError::Malformed)
    ));
}
