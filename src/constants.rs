//! Shared constants used across the application.

/// User agent string sent with every outbound request.
pub const USER_AGENT: &str = concat!("thread-curation-grader/", env!("CARGO_PKG_VERSION"));

/// Acceptance band for the ETH total (Foundation sales), inclusive.
pub const ETH_BAND: (f64, f64) = (0.9, 1.05);

/// Acceptance band for the XTZ total (objkt sales), inclusive.
pub const TEZ_BAND: (f64, f64) = (900.0, 1050.0);

/// objkt reports prices as integers with six implied decimals (mutez).
pub const MUTEZ_PER_TEZ: f64 = 1_000_000.0;

/// Maximum posts requested per conversation search.
pub const THREAD_MAX_RESULTS: u32 = 100;

/// Maximum handles per user lookup request.
pub const USER_LOOKUP_BATCH_SIZE: usize = 100;
