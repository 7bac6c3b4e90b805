//! Size-hiding padding: the rounding function and the bytes it produces.

use seekvault::{
    META_BLOCK_LEN_COMPACT, SealOptions, pad_size, seal_bytes,
};

#[test]
fn worked_examples() {
    assert_eq!(pad_size(12, 0), 20);
    assert_eq!(pad_size(499, 0), 500);
    assert_eq!(pad_size(499, 2), 600);
    assert_eq!(pad_size(10_023_304_423, 0), 10_024_000_000);
}

#[test]
fn bound_holds_across_magnitudes() {
    fn unit(length: u64) -> u64 {
        let digits = if length == 0 {
            1
        } else {
            length.ilog10() + 1
        };
        10u64.pow(digits.div_ceil(2))
    }

    let lengths = [
        0u64, 1, 9, 10, 11, 99, 100, 101, 999, 1000, 32768, 65535, 1_000_000, 123_456_789,
        10_023_304_423,
    ];
    for &len in &lengths {
        let padded = pad_size(len, 0);
        assert!(padded >= len, "len={len}");
        assert!(padded < len + unit(len), "len={len}");
        assert_eq!(padded % unit(len), 0, "len={len}");
    }
}

#[test]
fn reserve_always_fits_inside_padded_total() {
    for &len in &[0u64, 1, 12, 499, 1024, 32768, 100_000] {
        for &reserve in &[0u64, 2, 1024, 4096] {
            let total = pad_size(len, reserve);
            assert!(total >= len + reserve, "len={len} reserve={reserve}");
        }
    }
}

#[test]
fn sealed_size_equals_pad_size() {
    for len in [0usize, 1, 12, 499, 5000, 40_000] {
        let data = vec![0xA5u8; len];
        let sealed = seal_bytes(&data, b"pw", &SealOptions::default()).unwrap();
        assert_eq!(
            sealed.bytes.len() as u64,
            pad_size(len as u64, META_BLOCK_LEN_COMPACT as u64),
            "len={len}"
        );
    }
}

#[test]
fn padding_region_has_no_zero_bytes() {
    let len = 5000usize;
    let data = vec![0x11u8; len];
    let sealed = seal_bytes(&data, b"pw", &SealOptions::default()).unwrap();

    let total = sealed.bytes.len();
    let padding = &sealed.bytes[len..total - META_BLOCK_LEN_COMPACT];
    assert!(!padding.is_empty());
    assert!(padding.iter().all(|&b| b != 0));
}
