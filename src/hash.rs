//! cyrb53 string hash used to name cache files.
//!
//! Operates on UTF-16 code units with 32-bit wrapping multiplication so the
//! resulting numbers match cache files written by earlier JavaScript tooling.

/// Compute the 53-bit cyrb53 hash of `input` with the given seed.
#[must_use]
pub fn cyrb53(input: &str, seed: u32) -> u64 {
    let mut h1: u32 = 0xdead_beef ^ seed;
    let mut h2: u32 = 0x41c6_ce57 ^ seed;

    for ch in input.encode_utf16() {
        let ch = u32::from(ch);
        h1 = (h1 ^ ch).wrapping_mul(2_654_435_761);
        h2 = (h2 ^ ch).wrapping_mul(1_597_334_677);
    }

    h1 = (h1 ^ (h1 >> 16)).wrapping_mul(2_246_822_507);
    h1 ^= (h2 ^ (h2 >> 13)).wrapping_mul(3_266_489_909);
    h2 = (h2 ^ (h2 >> 16)).wrapping_mul(2_246_822_507);
    h2 ^= (h1 ^ (h1 >> 13)).wrapping_mul(3_266_489_909);

    (u64::from(h2 & 0x001f_ffff) << 32) | u64::from(h1)
}

/// Cache key for a resolver input URL (case-insensitive).
#[must_use]
pub fn url_cache_key(url: &str) -> u64 {
    cyrb53(&url.to_lowercase(), 0)
}
