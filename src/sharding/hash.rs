//! Key hashing shared by every node of the cluster.
//!
//! Routing depends on all processes computing the same value for a key, so
//! this is a fixed 64-bit FNV-1 over the raw key bytes. Never replace it with
//! `std::hash` hashers: their output is seeded or unspecified across builds.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1 (multiply, then xor).
pub fn fnv1_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        hash.wrapping_mul(FNV_PRIME) ^ u64::from(byte)
    })
}
