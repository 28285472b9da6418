//! Integration tests for transactional access to the shared relational
//! store (spec.md §2.3, §4.1).

use chrono::Utc;
use portal_watch::repository::Repository;
use sqlx::PgPool;
use uuid::Uuid;

async fn insert_tenant(pool: &PgPool, name: &str, scrape_enabled: bool) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO tenants (name, scrape_enabled) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(scrape_enabled)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_case_file(
    pool: &PgPool,
    tenant_id: Uuid,
    external_case_number: &str,
    scrape_enabled: bool,
    scan_valid: bool,
    archived: bool,
) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO case_files (tenant_id, external_case_number, party_name, scrape_enabled, scan_valid, archived) \
         VALUES ($1, $2, 'Jane Doe', $3, $4, $5) RETURNING id",
    )
    .bind(tenant_id)
    .bind(external_case_number)
    .bind(scrape_enabled)
    .bind(scan_valid)
    .bind(archived)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test]
async fn health_check_succeeds_against_a_live_pool(pool: PgPool) {
    let repo = Repository::new(pool);
    repo.health_check().await.unwrap();
}

#[sqlx::test]
async fn tenant_find_returns_none_for_unknown_id(pool: PgPool) {
    let repo = Repository::new(pool);
    assert!(repo.tenants().find(Uuid::new_v4()).await.unwrap().is_none());
}

#[sqlx::test]
async fn enabled_monitoring_schedules_excludes_disabled_tenant(pool: PgPool) {
    let enabled_tenant = insert_tenant(&pool, "Juzgado Uno", true).await;
    let disabled_tenant = insert_tenant(&pool, "Juzgado Dos", false).await;

    sqlx::query(
        "INSERT INTO notification_schedules (tenant_id, logic_key, times, enabled) \
         VALUES ($1, 'portal-monitoring', '{08:00,16:00}', true)",
    )
    .bind(enabled_tenant)
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO notification_schedules (tenant_id, logic_key, times, enabled) \
         VALUES ($1, 'portal-monitoring', '{08:00}', true)",
    )
    .bind(disabled_tenant)
    .execute(&pool)
    .await
    .unwrap();

    let repo = Repository::new(pool);
    let schedules = repo.tenants().enabled_monitoring_schedules().await.unwrap();

    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0].tenant_id, enabled_tenant);
}

#[sqlx::test]
async fn enabled_monitoring_schedules_excludes_disabled_schedule_and_other_logic_keys(pool: PgPool) {
    let tenant_id = insert_tenant(&pool, "Juzgado Uno", true).await;

    sqlx::query(
        "INSERT INTO notification_schedules (tenant_id, logic_key, times, enabled) \
         VALUES ($1, 'portal-monitoring', '{08:00}', false)",
    )
    .bind(tenant_id)
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO notification_schedules (tenant_id, logic_key, times, enabled) \
         VALUES ($1, 'other-logic', '{08:00}', true)",
    )
    .bind(tenant_id)
    .execute(&pool)
    .await
    .unwrap();

    let repo = Repository::new(pool);
    let schedules = repo.tenants().enabled_monitoring_schedules().await.unwrap();
    assert!(schedules.is_empty());
}

#[sqlx::test]
async fn eligible_for_tenant_filters_scrape_disabled_scan_invalid_and_archived(pool: PgPool) {
    let tenant_id = insert_tenant(&pool, "Juzgado Uno", true).await;

    let eligible = insert_case_file(&pool, tenant_id, "001-2024", true, true, false).await;
    insert_case_file(&pool, tenant_id, "002-2024", false, true, false).await; // scrape disabled
    insert_case_file(&pool, tenant_id, "003-2024", true, false, false).await; // scan invalid
    insert_case_file(&pool, tenant_id, "004-2024", true, true, true).await; // archived

    let repo = Repository::new(pool);
    let case_files = repo.case_files().eligible_for_tenant(tenant_id).await.unwrap();

    assert_eq!(case_files.len(), 1);
    assert_eq!(case_files[0].id, eligible);
}

#[sqlx::test]
async fn mark_scanned_updates_last_scraped_at_and_pending_changes(pool: PgPool) {
    let tenant_id = insert_tenant(&pool, "Juzgado Uno", true).await;
    let case_file_id = insert_case_file(&pool, tenant_id, "001-2024", true, true, false).await;

    let repo = Repository::new(pool);
    let now = Utc::now();
    repo.case_files().mark_scanned(case_file_id, now, true).await.unwrap();

    let cf = repo.case_files().find(case_file_id).await.unwrap().unwrap();
    assert!(cf.has_pending_changes);
    assert!(cf.last_scraped_at.is_some());
}

#[sqlx::test]
async fn mark_scan_invalid_removes_case_file_from_eligible_set(pool: PgPool) {
    let tenant_id = insert_tenant(&pool, "Juzgado Uno", true).await;
    let case_file_id = insert_case_file(&pool, tenant_id, "001-2024", true, true, false).await;

    let repo = Repository::new(pool);
    repo.case_files().mark_scan_invalid(case_file_id).await.unwrap();

    let case_files = repo.case_files().eligible_for_tenant(tenant_id).await.unwrap();
    assert!(case_files.is_empty());
}
