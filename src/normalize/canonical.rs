//! Normalization rules (spec.md §4.8) and the canonical binnacle shape
//! used for both hashing and diffing.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Trim; empty or whitespace-only collapses to `None`.
pub fn normalize_string(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse as a base-10 integer; any parse failure (including the literal
/// `"-"` the Portal uses for absent values) becomes `None`.
pub fn normalize_numeric(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim).and_then(|s| s.parse::<i64>().ok())
}

/// Parse the Portal's `DD/MM/YYYY[ HH:MM[:SS]]` format. Unparseable input
/// or the literal `"-"` becomes `None`.
pub fn normalize_date(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty() && *s != "-")?;

    for fmt in ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M", "%d/%m/%Y"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
        if fmt == "%d/%m/%Y" {
            if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, fmt) {
                return Some(date.and_hms_opt(0, 0, 0).unwrap());
            }
        }
    }
    None
}

/// The fields that participate in hashing and diffing (spec.md §4.8).
/// `notification_count` is included explicitly so that an added
/// notification changes the hash even when every other field matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalBinnacle {
    pub index: i32,
    pub resolution_date: Option<String>,
    pub entry_date: Option<String>,
    pub resolution: Option<String>,
    pub notification_type: Option<String>,
    pub acto: Option<String>,
    pub fojas: Option<i64>,
    pub folios: Option<i64>,
    pub proveido_date: Option<String>,
    pub sumilla: Option<String>,
    pub user_description: Option<String>,
    pub notification_count: i64,
}

impl CanonicalBinnacle {
    /// The `(resolutionDate, entryDate, resolution)` identity key used by
    /// the Differ to match entries across two scrapes (spec.md §4.9).
    pub fn diff_key(&self) -> (Option<String>, Option<String>, Option<String>) {
        (
            self.resolution_date.clone(),
            self.entry_date.clone(),
            self.resolution.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_string_normalizes_to_none() {
        assert_eq!(normalize_string(Some("   ")), None);
        assert_eq!(normalize_string(Some("")), None);
        assert_eq!(normalize_string(Some(" X ")), Some("X".to_string()));
    }

    #[test]
    fn dash_and_garbage_numeric_normalize_to_none() {
        assert_eq!(normalize_numeric(Some("-")), None);
        assert_eq!(normalize_numeric(Some("abc")), None);
        assert_eq!(normalize_numeric(Some(" 42 ")), Some(42));
    }

    #[test]
    fn portal_date_formats_parse() {
        assert!(normalize_date(Some("15/03/2024")).is_some());
        assert!(normalize_date(Some("15/03/2024 09:30")).is_some());
        assert!(normalize_date(Some("15/03/2024 09:30:05")).is_some());
        assert_eq!(normalize_date(Some("-")), None);
        assert_eq!(normalize_date(Some("not a date")), None);
    }
}
