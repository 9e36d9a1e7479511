//! Thread curation grader library.
//!
//! Audits curator-submitted X threads of digital-art auction listings: every
//! post's first link is priced on its marketplace, totals are checked against
//! fixed bands, and the resulting record is archived to IPFS.

#![allow(clippy::needless_raw_string_hashes)]

pub mod cache;
pub mod config;
pub mod constants;
pub mod curation;
pub mod hash;
pub mod ipfs;
pub mod marketplace;
pub mod parser;
pub mod report;
pub mod submission;
pub mod twitter;
