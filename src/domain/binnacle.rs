use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One dated entry on a CaseFile's timeline. `(case_file_id, index)` is
/// unique; never deleted by this service (soft-delete is externally
/// managed — see spec.md's reconciliation of "remove" semantics).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Binnacle {
    pub id: Uuid,
    pub case_file_id: Uuid,
    pub index: i32,
    pub resolution_date: Option<DateTime<Utc>>,
    pub entry_date: Option<DateTime<Utc>>,
    pub acto: Option<String>,
    pub fojas: Option<i64>,
    pub folios: Option<i64>,
    pub proveido_date: Option<DateTime<Utc>>,
    pub sumilla: Option<String>,
    pub user_description: Option<String>,
    pub notification_type: Option<String>,
    pub type_tag: BinnacleTypeTag,
    pub procedural_stage_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "binnacle_type_tag", rename_all = "UPPERCASE")]
pub enum BinnacleTypeTag {
    Resolution,
    Writ,
}

impl BinnacleTypeTag {
    /// `typeTag = RESOLUTION` iff `resolutionDate` is present (spec.md §3).
    pub fn derive(resolution_date: &Option<DateTime<Utc>>) -> Self {
        if resolution_date.is_some() {
            BinnacleTypeTag::Resolution
        } else {
            BinnacleTypeTag::Writ
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_follows_resolution_date_presence() {
        assert_eq!(
            BinnacleTypeTag::derive(&Some(Utc::now())),
            BinnacleTypeTag::Resolution
        );
        assert_eq!(BinnacleTypeTag::derive(&None), BinnacleTypeTag::Writ);
    }
}
