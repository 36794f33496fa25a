//! Content-identity hashing for persisted corpus entries.
//!
//! The forward/reverse CRC64 pair is a collaborator contract this crate only
//! *consumes* conceptually — the same way `xxhash.rs` wraps the
//! `xxhash-rust` crate rather than reimplementing XXH32. Here the wrapped
//! crate is `crc`.
//!
//! Two independent 64-bit digests of the same bytes — forward and reverse —
//! are combined into the 32-hex-digit content-identity prefix of an output
//! filename. The reverse digest is the same CRC-64/XZ algorithm run over the
//! byte sequence reversed, not a different polynomial; this is enough to
//! make accidental collisions between unrelated inputs implausible while
//! keeping a single, well-known algorithm instance.

use crc::{Algorithm, Crc, CRC_64_XZ};

const ALGO: Algorithm<u64> = CRC_64_XZ;
static ENGINE: Crc<u64> = Crc::<u64>::new(&ALGO);

/// Forward CRC64 of `data`.
pub fn crc64_forward(data: &[u8]) -> u64 {
    ENGINE.checksum(data)
}

/// CRC64 of `data` read back-to-front.
pub fn crc64_reverse(data: &[u8]) -> u64 {
    let reversed: Vec<u8> = data.iter().rev().copied().collect();
    ENGINE.checksum(&reversed)
}

/// Formats the content-identity portion of an output filename:
/// `{16-hex forward}{16-hex reverse}.{8-hex length}`.
pub fn content_identity_name(data: &[u8]) -> String {
    format!(
        "{:016x}{:016x}.{:08x}.honggfuzz.cov",
        crc64_forward(data),
        crc64_reverse(data),
        data.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_deterministic() {
        let a = crc64_forward(b"");
        let b = crc64_forward(b"");
        assert_eq!(a, b);
    }

    #[test]
    fn forward_and_reverse_differ_for_asymmetric_input() {
        let data = b"asymmetric payload";
        assert_ne!(crc64_forward(data), crc64_reverse(data));
    }

    #[test]
    fn forward_and_reverse_agree_for_palindrome() {
        let data = b"abccba";
        assert_eq!(crc64_forward(data), crc64_reverse(data));
    }

    #[test]
    fn name_matches_documented_format() {
        let data = b"\x00\x01\x02\x03";
        let name = content_identity_name(data);
        assert!(name.ends_with(".00000004.honggfuzz.cov"));
        assert_eq!(name.len(), 16 + 16 + 1 + 8 + 1 + "honggfuzz.cov".len());
    }

    #[test]
    fn name_is_stable_across_calls() {
        let data = b"stable content";
        assert_eq!(content_identity_name(data), content_identity_name(data));
    }
}
