use uuid::Uuid;

use crate::domain::Tenant;
use crate::error::Result;
use crate::repository::Repository;

pub struct TenantOps<'a> {
    repo: &'a Repository,
}

/// A `NotificationSchedule` joined with its owning `Tenant`'s id, the
/// shape the Scheduler actually needs at §4.1 step 1-2 (which Tenant to
/// load CaseFiles for).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduleWithTenant {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub schedule_id: Uuid,
    pub times: Vec<String>,
}

impl<'a> TenantOps<'a> {
    pub(crate) fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    pub async fn find(&self, tenant_id: Uuid) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(self.repo.pool())
            .await?;
        Ok(tenant)
    }

    /// All enabled `portal-monitoring` schedules joined to active Tenants
    /// (spec.md §4.1 step 1).
    pub async fn enabled_monitoring_schedules(&self) -> Result<Vec<ScheduleWithTenant>> {
        let rows = sqlx::query_as::<_, ScheduleWithTenant>(
            r#"
            SELECT
                t.id AS tenant_id, t.name AS tenant_name,
                s.id AS schedule_id, s.times
            FROM notification_schedules s
            JOIN tenants t ON t.id = s.tenant_id
            WHERE s.enabled = true
              AND s.logic_key = 'portal-monitoring'
              AND t.scrape_enabled = true
            "#,
        )
        .fetch_all(self.repo.pool())
        .await?;
        Ok(rows)
    }
}
