//! Property-based round trips across sizes, for both pipelines.

use std::io::{Cursor, Read, Seek, SeekFrom};

use seekvault::{SealOptions, SecureStreamReader, open_bytes, seal_bytes};

use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24,
        timeout: 60_000,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_sequential_round_trip(
        size in 0usize..200_000,
        key in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let mut data = vec![0u8; size];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i as u32).wrapping_mul(1103515245).wrapping_add(12345) as u8;
        }

        let sealed = seal_bytes(&data, &key, &SealOptions::default()).unwrap();
        let back = open_bytes(&sealed.bytes, &key, &sealed.salt).unwrap();
        prop_assert_eq!(back, data);
    }

    #[test]
    fn prop_random_window_matches(
        size in 1usize..150_000,
        window in any::<(u64, u16)>(),
    ) {
        let mut data = vec![0u8; size];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i as u32).wrapping_mul(2654435761) as u8;
        }

        let sealed = seal_bytes(&data, b"prop", &SealOptions::default()).unwrap();
        let mut reader =
            SecureStreamReader::open(Cursor::new(sealed.bytes), b"prop", &sealed.salt).unwrap();

        let offset = window.0 % size as u64;
        let len = (window.1 as usize).min(size - offset as usize);
        reader.seek(SeekFrom::Start(offset)).unwrap();
        let mut got = vec![0u8; len];
        reader.read_exact(&mut got).unwrap();
        prop_assert_eq!(&got[..], &data[offset as usize..offset as usize + len]);
    }
}
