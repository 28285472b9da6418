use uuid::Uuid;

use crate::domain::{FileAttachment, Notification};
use crate::error::Result;
use crate::repository::Repository;

pub struct NotificationOps<'a> {
    repo: &'a Repository,
}

impl<'a> NotificationOps<'a> {
    pub(crate) fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Bulk-insert with no dedup — the Portal is the source of truth, and
    /// duplicates across re-scrapes are acceptable and rare (spec.md §4.6
    /// step 10b).
    pub async fn bulk_insert(
        &self,
        tx: &mut sqlx::PgConnection,
        notifications: &[Notification],
    ) -> Result<()> {
        for n in notifications {
            sqlx::query(
                r#"
                INSERT INTO notifications (
                    id, binnacle_id, code, addressee, ship_date, attachments,
                    delivery_method, status_date_1, status_date_2, status_date_3,
                    status_date_4, status_date_5, status_date_6
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(n.id)
            .bind(n.binnacle_id)
            .bind(&n.code)
            .bind(&n.addressee)
            .bind(n.ship_date)
            .bind(&n.attachments)
            .bind(&n.delivery_method)
            .bind(n.status_date_1)
            .bind(n.status_date_2)
            .bind(n.status_date_3)
            .bind(n.status_date_4)
            .bind(n.status_date_5)
            .bind(n.status_date_6)
            .execute(&mut *tx)
            .await?;
        }
        Ok(())
    }

    pub async fn file_attachment_exists(
        &self,
        tx: &mut sqlx::PgConnection,
        binnacle_id: Uuid,
        original_name: &str,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM file_attachments WHERE binnacle_id = $1 AND original_name = $2)",
        )
        .bind(binnacle_id)
        .bind(original_name)
        .fetch_one(&mut *tx)
        .await?;
        Ok(exists)
    }

    pub async fn insert_file_attachment(
        &self,
        tx: &mut sqlx::PgConnection,
        attachment: &FileAttachment,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO file_attachments (id, binnacle_id, original_name, size, object_store_key) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(attachment.id)
        .bind(attachment.binnacle_id)
        .bind(&attachment.original_name)
        .bind(attachment.size)
        .bind(&attachment.object_store_key)
        .execute(&mut *tx)
        .await?;
        Ok(())
    }
}
