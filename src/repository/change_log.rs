use crate::domain::ChangeLogEntry;
use crate::error::Result;
use crate::repository::Repository;

pub struct ChangeLogOps<'a> {
    repo: &'a Repository,
}

impl<'a> ChangeLogOps<'a> {
    pub(crate) fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Append-only (spec.md §3, §6): never updates `notified` itself, that
    /// bit is owned by the external consumer.
    pub async fn bulk_insert(
        &self,
        tx: &mut sqlx::PgConnection,
        entries: &[ChangeLogEntry],
    ) -> Result<()> {
        for e in entries {
            sqlx::query(
                r#"
                INSERT INTO change_log_entries (
                    id, case_file_id, tenant_id, change_type, field_name,
                    old_value, new_value, detected_at, notified, notified_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false, NULL)
                "#,
            )
            .bind(e.id)
            .bind(e.case_file_id)
            .bind(e.tenant_id)
            .bind(e.change_type)
            .bind(&e.field_name)
            .bind(&e.old_value)
            .bind(&e.new_value)
            .bind(e.detected_at)
            .execute(&mut *tx)
            .await?;
        }
        Ok(())
    }
}
