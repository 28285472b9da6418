//! ChangeDetector + Differ (spec.md §4.9): hash-fast-path plus a
//! structured diff slow-path keyed by `(resolutionDate, entryDate,
//! resolution)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::canonical::CanonicalBinnacle;
use super::hash::hash_binnacles;

/// One detected field- or structural-level change, pre-`ChangeLogEntry`
/// shape (the caller attaches `caseFileId`/`tenantId`/ids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedChange {
    pub change_type: ChangeKind,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    NewBinnacle,
    ModifiedBinnacle,
    RemovedBinnacle,
}

pub struct DetectChangeResult {
    pub is_first_scrape: bool,
    pub has_changes: bool,
    pub changes: Vec<DetectedChange>,
    pub new_hash: String,
    pub old_hash: String,
    pub detected_at: DateTime<Utc>,
}

/// Fields compared field-by-field for `MODIFIED_BINNACLE` emission
/// (spec.md §4.9), in emission order.
const COMPARED_FIELDS: &[&str] = &[
    "notification_type",
    "acto",
    "fojas",
    "folios",
    "proveido_date",
    "sumilla",
    "user_description",
    "notification_count",
];

fn field_value(b: &CanonicalBinnacle, field: &str) -> Option<String> {
    match field {
        "notification_type" => b.notification_type.clone(),
        "acto" => b.acto.clone(),
        "fojas" => b.fojas.map(|v| v.to_string()),
        "folios" => b.folios.map(|v| v.to_string()),
        "proveido_date" => b.proveido_date.clone(),
        "sumilla" => b.sumilla.clone(),
        "user_description" => b.user_description.clone(),
        "notification_count" => Some(b.notification_count.to_string()),
        _ => unreachable!("unknown compared field {field}"),
    }
}

/// `newList` vs the prior Snapshot's canonical payload and hash.
///
/// - No prior payload → first scrape: `hasChanges=true`, no ChangeLogEntry
///   emission (the initial state is not itself a "change").
/// - Hash match → no changes, no diff computed.
/// - Hash mismatch → structured diff, deterministic order: iterate `new`
///   by index, then iterate unmatched `old` by original insertion order.
pub fn diff(
    new_list: &[CanonicalBinnacle],
    prev: Option<&[CanonicalBinnacle]>,
    prev_hash: &str,
    now: DateTime<Utc>,
) -> DetectChangeResult {
    let new_hash = hash_binnacles(new_list);

    let Some(prev) = prev.filter(|p| !p.is_empty()) else {
        return DetectChangeResult {
            is_first_scrape: true,
            has_changes: true,
            changes: Vec::new(),
            new_hash,
            old_hash: String::new(),
            detected_at: now,
        };
    };

    if new_hash == prev_hash {
        return DetectChangeResult {
            is_first_scrape: false,
            has_changes: false,
            changes: Vec::new(),
            new_hash,
            old_hash: prev_hash.to_string(),
            detected_at: now,
        };
    }

    let mut sorted_new: Vec<&CanonicalBinnacle> = new_list.iter().collect();
    sorted_new.sort_by_key(|b| b.index);

    let mut matched_old_keys = std::collections::HashSet::new();
    let mut changes = Vec::new();

    for n in &sorted_new {
        let key = n.diff_key();
        match prev.iter().find(|o| o.diff_key() == key) {
            None => changes.push(DetectedChange {
                change_type: ChangeKind::NewBinnacle,
                field_name: None,
                old_value: None,
                new_value: None,
            }),
            Some(old) => {
                matched_old_keys.insert(key);
                for field in COMPARED_FIELDS {
                    let old_v = field_value(old, field);
                    let new_v = field_value(n, field);
                    if old_v != new_v {
                        changes.push(DetectedChange {
                            change_type: ChangeKind::ModifiedBinnacle,
                            field_name: Some((*field).to_string()),
                            old_value: old_v,
                            new_value: new_v,
                        });
                    }
                }
            }
        }
    }

    for old in prev {
        if !matched_old_keys.contains(&old.diff_key()) {
            changes.push(DetectedChange {
                change_type: ChangeKind::RemovedBinnacle,
                field_name: None,
                old_value: None,
                new_value: None,
            });
        }
    }

    DetectChangeResult {
        is_first_scrape: false,
        has_changes: true,
        changes,
        new_hash,
        old_hash: prev_hash.to_string(),
        detected_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binnacle(index: i32, acto: &str) -> CanonicalBinnacle {
        CanonicalBinnacle {
            index,
            resolution_date: None,
            entry_date: None,
            resolution: Some(format!("R{index}")),
            notification_type: None,
            acto: Some(acto.to_string()),
            fojas: None,
            folios: None,
            proveido_date: None,
            sumilla: None,
            user_description: None,
            notification_count: 0,
        }
    }

    #[test]
    fn first_scrape_has_changes_but_no_entries() {
        let list = vec![binnacle(1, "X")];
        let result = diff(&list, None, "", Utc::now());
        assert!(result.is_first_scrape);
        assert!(result.has_changes);
        assert!(result.changes.is_empty());
    }

    #[test]
    fn identical_hash_short_circuits_to_no_changes() {
        let list = vec![binnacle(1, "X")];
        let hash = hash_binnacles(&list);
        let result = diff(&list, Some(&list), &hash, Utc::now());
        assert!(!result.has_changes);
        assert!(result.changes.is_empty());
    }

    #[test]
    fn modified_field_produces_one_entry() {
        let old = vec![binnacle(2, "X")];
        let mut newer = old.clone();
        newer[0].acto = Some("Y".to_string());
        let old_hash = hash_binnacles(&old);
        let result = diff(&newer, Some(&old), &old_hash, Utc::now());
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].change_type, ChangeKind::ModifiedBinnacle);
        assert_eq!(result.changes[0].field_name.as_deref(), Some("acto"));
        assert_eq!(result.changes[0].old_value.as_deref(), Some("X"));
        assert_eq!(result.changes[0].new_value.as_deref(), Some("Y"));
    }

    #[test]
    fn new_and_removed_without_modified_on_unrelated_entry() {
        let old = vec![binnacle(1, "A"), binnacle(2, "B")];
        let newer = vec![binnacle(1, "A"), binnacle(3, "C")];
        let old_hash = hash_binnacles(&old);
        let result = diff(&newer, Some(&old), &old_hash, Utc::now());

        let new_count = result
            .changes
            .iter()
            .filter(|c| c.change_type == ChangeKind::NewBinnacle)
            .count();
        let removed_count = result
            .changes
            .iter()
            .filter(|c| c.change_type == ChangeKind::RemovedBinnacle)
            .count();
        let modified_count = result
            .changes
            .iter()
            .filter(|c| c.change_type == ChangeKind::ModifiedBinnacle)
            .count();

        assert_eq!(new_count, 1);
        assert_eq!(removed_count, 1);
        assert_eq!(modified_count, 0);
    }
}
