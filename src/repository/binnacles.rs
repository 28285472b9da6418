use uuid::Uuid;

use crate::domain::Binnacle;
use crate::error::Result;
use crate::repository::Repository;

pub struct BinnacleOps<'a> {
    repo: &'a Repository,
}

impl<'a> BinnacleOps<'a> {
    pub(crate) fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    pub async fn for_case_file(&self, case_file_id: Uuid) -> Result<Vec<Binnacle>> {
        let rows = sqlx::query_as::<_, Binnacle>(
            "SELECT * FROM binnacles WHERE case_file_id = $1 ORDER BY index ASC",
        )
        .bind(case_file_id)
        .fetch_all(self.repo.pool())
        .await?;
        Ok(rows)
    }

    /// Upsert by `(case_file_id, index)`: bulk-create new indices,
    /// in-place update existing ones. Indices absent from `binnacles` are
    /// left untouched — this service never deletes a Binnacle row
    /// (spec.md §3, §9).
    ///
    /// Returns the persisted id for each input binnacle, in the same
    /// order as `binnacles`. On conflict the row's original `id` wins
    /// (the conflict target is `(case_file_id, index)`, not `id`, and
    /// `id` is never part of the `DO UPDATE SET` list), so callers must
    /// use the returned ids rather than `binnacles[i].id` when wiring up
    /// `Notification`/`FileAttachment` rows that reference a binnacle —
    /// a re-scraped index keeps the id it was first persisted with.
    pub async fn upsert_all(
        &self,
        tx: &mut sqlx::PgConnection,
        case_file_id: Uuid,
        binnacles: &[Binnacle],
    ) -> Result<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(binnacles.len());
        for b in binnacles {
            let id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO binnacles (
                    id, case_file_id, index, resolution_date, entry_date, acto,
                    fojas, folios, proveido_date, sumilla, user_description,
                    notification_type, type_tag, procedural_stage_ref
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ON CONFLICT (case_file_id, index) DO UPDATE SET
                    resolution_date = EXCLUDED.resolution_date,
                    entry_date = EXCLUDED.entry_date,
                    acto = EXCLUDED.acto,
                    fojas = EXCLUDED.fojas,
                    folios = EXCLUDED.folios,
                    proveido_date = EXCLUDED.proveido_date,
                    sumilla = EXCLUDED.sumilla,
                    user_description = EXCLUDED.user_description,
                    notification_type = EXCLUDED.notification_type,
                    type_tag = EXCLUDED.type_tag,
                    procedural_stage_ref = EXCLUDED.procedural_stage_ref
                RETURNING id
                "#,
            )
            .bind(b.id)
            .bind(case_file_id)
            .bind(b.index)
            .bind(b.resolution_date)
            .bind(b.entry_date)
            .bind(&b.acto)
            .bind(b.fojas)
            .bind(b.folios)
            .bind(b.proveido_date)
            .bind(&b.sumilla)
            .bind(&b.user_description)
            .bind(&b.notification_type)
            .bind(b.type_tag)
            .bind(&b.procedural_stage_ref)
            .fetch_one(&mut *tx)
            .await?;
            ids.push(id);
        }
        Ok(ids)
    }
}
