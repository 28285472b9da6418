//! Normalizer + Hasher + Differ (spec.md §4.8, §4.9): pure functions that
//! turn raw extraction output into canonical binnacle records, a content
//! hash, and a structured diff against the prior Snapshot. No I/O here —
//! these are the only parts of the core that don't touch a suspension
//! point, which is why they're unit-tested directly rather than through
//! `tests/` integration fixtures, following the teacher's
//! `scraper/adaptive.rs` placement of pure-logic tests beside the code.

pub mod canonical;
pub mod differ;
pub mod hash;

pub use canonical::{normalize_date, normalize_numeric, normalize_string, CanonicalBinnacle};
pub use differ::{diff, DetectChangeResult};
pub use hash::hash_binnacles;
