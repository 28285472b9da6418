//! The Worker's per-job pipeline (spec.md §4.6): the 12-step
//! navigate/submit/extract/normalize/diff/persist sequence run for every
//! job, INITIAL, MONITOR, or PRIORITY alike.

use chrono::Utc;
use uuid::Uuid;

use crate::browser::BrowserPool;
use crate::captcha::CaptchaChain;
use crate::clock::Clock;
use crate::domain::{
    Binnacle, BinnacleTypeTag, ChangeLogEntry, ChangeType, FileAttachment, JobKind, JobLogStatus,
    Notification, Snapshot,
};
use crate::error::{AppError, Result};
use crate::extractor::{FormSubmitter, PageState};
use crate::jobstore::{Job, Lane};
use crate::normalize::canonical::CanonicalBinnacle;
use crate::normalize::{hash_binnacles, normalize_date, normalize_numeric, normalize_string};
use crate::objectstore::ObjectStore;
use crate::repository::Repository;

const MAX_ANTIBOT_RETRIES: u32 = 2;

fn job_kind_for(lane: Lane) -> JobKind {
    match lane {
        Lane::Initial => JobKind::Initial,
        Lane::Monitor => JobKind::Monitor,
        Lane::Priority => JobKind::Priority,
    }
}

/// The Portal's dates carry no explicit offset; stored UTC-labelled.
fn to_utc(naive: Option<chrono::NaiveDateTime>) -> Option<chrono::DateTime<Utc>> {
    naive.map(|n| chrono::DateTime::from_naive_utc_and_offset(n, Utc))
}

/// Run the full pipeline for `job`. On success the JobStore marks the job
/// completed; on error the caller classifies via `AppError::kind()` and
/// applies retry policy.
#[allow(clippy::too_many_arguments)]
pub async fn run_pipeline(
    job: &Job,
    worker_id: &str,
    repository: &Repository,
    browser_pool: &BrowserPool,
    captcha_chain: &CaptchaChain,
    form_submitter: &dyn FormSubmitter,
    object_store: &ObjectStore,
    clock: &dyn Clock,
) -> Result<()> {
    let payload = job
        .payload()
        .map_err(|e| AppError::ValidationFailed(format!("unreadable job payload: {e}")))?;

    let started_at = clock.now();
    let job_log_id = repository
        .job_log()
        .start(payload.case_file_id, payload.tenant_id, job_kind_for(job.lane), job.attempt, worker_id, started_at)
        .await?;

    let result = run_pipeline_inner(job, repository, browser_pool, captcha_chain, form_submitter, object_store, clock, &payload).await;

    let completed_at = clock.now();
    let duration_ms = (completed_at - started_at).num_milliseconds().max(0);

    match &result {
        Ok(outcome) => {
            repository
                .job_log()
                .finish(
                    job_log_id,
                    JobLogStatus::Completed,
                    completed_at,
                    duration_ms,
                    Some(outcome.binnacle_count),
                    Some(outcome.changes_detected),
                    None,
                    None,
                )
                .await?;
        }
        Err(e) => {
            let kind = e.kind();
            if let Err(snap_err) = repository.snapshots().record_error(payload.case_file_id, &e.to_string()).await {
                tracing::warn!(case_file_id = %payload.case_file_id, error = ?snap_err, "failed to record snapshot error");
            }
            let status = JobLogStatus::terminal_for(kind.retryable(), job.attempt < job.max_attempts);
            repository
                .job_log()
                .finish(job_log_id, status, completed_at, duration_ms, None, None, Some(kind.as_str()), Some(&e.to_string()))
                .await?;
        }
    }

    result.map(|_| ())
}

struct PipelineOutcome {
    binnacle_count: i32,
    changes_detected: i32,
}

#[allow(clippy::too_many_arguments)]
async fn run_pipeline_inner(
    job: &Job,
    repository: &Repository,
    browser_pool: &BrowserPool,
    captcha_chain: &CaptchaChain,
    form_submitter: &dyn FormSubmitter,
    object_store: &ObjectStore,
    clock: &dyn Clock,
    payload: &crate::jobstore::JobPayload,
) -> Result<PipelineOutcome> {
    // Step: read partyName via Repository (used later for ChangeLogEntry
    // context and validation, not persisted here).
    let case_file = repository
        .case_files()
        .find(payload.case_file_id)
        .await?
        .ok_or_else(|| AppError::ValidationFailed("case file no longer exists".to_string()))?;

    let mut force_recycle = false;
    let mut antibot_retries = 0u32;
    let guard = browser_pool.acquire("about:blank").await?;

    let page_state = loop {
        form_submitter.navigate(&guard.page).await?;
        let state = form_submitter.submit(&guard.page, &payload.case_number, &case_file.party_name).await?;

        match state {
            PageState::AntibotInterposition => {
                antibot_retries += 1;
                if antibot_retries > MAX_ANTIBOT_RETRIES {
                    guard.release(force_recycle).await;
                    return Err(AppError::BotDetected(format!(
                        "antibot interposition persisted after {antibot_retries} retries"
                    )));
                }
                // Run the chain on the interposed page itself; whether or
                // not it solves, loop back to re-navigate and resubmit
                // (exhaustion is caught by the retry counter above).
                let _ = captcha_chain.run(&guard.page).await?;
                continue;
            }
            PageState::CaptchaError => {
                let outcome = captcha_chain.run(&guard.page).await?;
                match outcome {
                    Some(o) if o.solved => continue,
                    _ => {
                        guard.release(force_recycle).await;
                        return Err(AppError::CaptchaFailed("no captcha strategy solved the challenge".to_string()));
                    }
                }
            }
            PageState::NoResults => break state,
            PageState::Results => break state,
        }
    };

    if page_state == PageState::NoResults {
        repository.case_files().mark_scan_invalid(case_file.id).await?;
        guard.release(force_recycle).await;
        return Err(AppError::InvalidCaseNumber);
    }

    let raw_binnacles = match form_submitter.extract_binnacles(&guard.page).await {
        Ok(b) => b,
        Err(e) => {
            force_recycle = e.kind().forces_session_recycle();
            guard.release(force_recycle).await;
            return Err(e);
        }
    };
    let raw_notifications = form_submitter.extract_notifications(&guard.page).await.unwrap_or_default();
    let raw_files = form_submitter.extract_file_links(&guard.page).await.unwrap_or_default();

    if raw_binnacles.is_empty() {
        guard.release(force_recycle).await;
        return Err(AppError::ValidationFailed("no binnacle rows extracted from results page".to_string()));
    }

    let canonical: Vec<CanonicalBinnacle> = raw_binnacles
        .iter()
        .map(|raw| CanonicalBinnacle {
            index: raw.index,
            resolution_date: normalize_date(raw.resolution_date.as_deref()).map(|d| d.to_string()),
            entry_date: normalize_date(raw.entry_date.as_deref()).map(|d| d.to_string()),
            resolution: normalize_string(raw.sumilla.as_deref()),
            notification_type: normalize_string(raw.notification_type.as_deref()),
            acto: normalize_string(raw.acto.as_deref()),
            fojas: normalize_numeric(raw.fojas.as_deref()),
            folios: normalize_numeric(raw.folios.as_deref()),
            proveido_date: normalize_date(raw.proveido_date.as_deref()).map(|d| d.to_string()),
            sumilla: normalize_string(raw.sumilla.as_deref()),
            user_description: normalize_string(raw.user_description.as_deref()),
            notification_count: raw_notifications.iter().filter(|n| n.binnacle_index == raw.index).count() as i64,
        })
        .collect();

    let prior_snapshot = repository.snapshots().find(case_file.id).await?;
    let prior_canonical: Option<Vec<CanonicalBinnacle>> = prior_snapshot
        .as_ref()
        .map(|s| serde_json::from_value(s.canonical_payload.clone()).unwrap_or_default());

    let now = clock.now();
    let diff_result = crate::normalize::differ::diff(
        &canonical,
        prior_canonical.as_deref(),
        prior_snapshot.as_ref().map(|s| s.content_hash.as_str()).unwrap_or(""),
        now,
    );

    let mut tx = repository.pool().begin().await?;

    let mut binnacles: Vec<Binnacle> = raw_binnacles
        .iter()
        .zip(canonical.iter())
        .map(|(raw, c)| {
            let resolution_date = to_utc(normalize_date(raw.resolution_date.as_deref()));
            Binnacle {
                id: Uuid::new_v4(),
                case_file_id: case_file.id,
                index: raw.index,
                resolution_date,
                entry_date: to_utc(normalize_date(raw.entry_date.as_deref())),
                acto: c.acto.clone(),
                fojas: c.fojas,
                folios: c.folios,
                proveido_date: to_utc(normalize_date(raw.proveido_date.as_deref())),
                sumilla: c.sumilla.clone(),
                user_description: c.user_description.clone(),
                notification_type: c.notification_type.clone(),
                type_tag: BinnacleTypeTag::derive(&resolution_date),
                procedural_stage_ref: None,
            }
        })
        .collect();

    // ON CONFLICT keeps the existing row's id for a binnacle index that
    // was already persisted; adopt the ids the upsert actually assigned
    // so downstream notification/file-attachment rows reference real FKs.
    let persisted_ids = repository.binnacles().upsert_all(&mut *tx, case_file.id, &binnacles).await?;
    for (binnacle, id) in binnacles.iter_mut().zip(persisted_ids) {
        binnacle.id = id;
    }

    let notifications: Vec<Notification> = raw_notifications
        .iter()
        .filter_map(|raw| {
            let binnacle = binnacles.get(raw.binnacle_index as usize)?;
            Some(Notification {
                id: Uuid::new_v4(),
                binnacle_id: binnacle.id,
                code: normalize_string(raw.code.as_deref()).unwrap_or_default(),
                addressee: normalize_string(raw.addressee.as_deref()),
                ship_date: to_utc(normalize_date(raw.ship_date.as_deref())),
                attachments: None,
                delivery_method: normalize_string(raw.delivery_method.as_deref()),
                status_date_1: None,
                status_date_2: None,
                status_date_3: None,
                status_date_4: None,
                status_date_5: None,
                status_date_6: None,
            })
        })
        .collect();

    if !notifications.is_empty() {
        repository.notifications().bulk_insert(&mut *tx, &notifications).await?;
    }

    for file in &raw_files {
        let Some(binnacle) = binnacles.get(file.binnacle_index as usize) else {
            continue;
        };
        if repository
            .notifications()
            .file_attachment_exists(&mut *tx, binnacle.id, &file.original_name)
            .await?
        {
            continue;
        }

        match form_submitter.download_file(&file.url).await {
            Ok(Some(bytes)) => {
                let key = ObjectStore::key_for(payload.tenant_id, case_file.id, binnacle.id, &file.original_name);
                match object_store.put(&key, bytes.clone()).await {
                    Ok(()) => {
                        repository
                            .notifications()
                            .insert_file_attachment(
                                &mut *tx,
                                &FileAttachment {
                                    id: Uuid::new_v4(),
                                    binnacle_id: binnacle.id,
                                    original_name: file.original_name.clone(),
                                    size: bytes.len() as i64,
                                    object_store_key: key,
                                },
                            )
                            .await?;
                    }
                    Err(e) => {
                        tracing::warn!(file = %file.original_name, error = ?e, "object store upload failed, continuing");
                    }
                }
            }
            Ok(None) => {
                tracing::warn!(file = %file.original_name, "file download returned no content, skipping");
            }
            Err(e) => {
                tracing::warn!(file = %file.original_name, error = ?e, "file download failed, skipping");
            }
        }
    }

    let new_hash = hash_binnacles(&canonical);
    let canonical_payload = serde_json::to_value(&canonical)
        .map_err(|e| AppError::ValidationFailed(format!("failed to serialize canonical payload: {e}")))?;

    let snapshot = Snapshot {
        case_file_id: case_file.id,
        content_hash: new_hash,
        binnacle_count: binnacles.len() as i32,
        canonical_payload,
        last_scraped_at: now,
        last_changed_at: if diff_result.has_changes { Some(now) } else { prior_snapshot.as_ref().and_then(|s| s.last_changed_at) },
        scrape_count: prior_snapshot.as_ref().map(|s| s.scrape_count + 1).unwrap_or(1),
        consecutive_no_change: if diff_result.has_changes { 0 } else { prior_snapshot.as_ref().map(|s| s.consecutive_no_change + 1).unwrap_or(0) },
        error_count: 0,
        last_error: None,
    };
    repository.snapshots().upsert(&mut *tx, &snapshot).await?;

    let changes_detected = diff_result.changes.len() as i32;
    if diff_result.has_changes && !diff_result.is_first_scrape && !diff_result.changes.is_empty() {
        let entries: Vec<ChangeLogEntry> = diff_result
            .changes
            .iter()
            .map(|c| ChangeLogEntry {
                id: Uuid::new_v4(),
                case_file_id: case_file.id,
                tenant_id: payload.tenant_id,
                change_type: match c.change_type {
                    crate::normalize::differ::ChangeKind::NewBinnacle => ChangeType::NewBinnacle,
                    crate::normalize::differ::ChangeKind::ModifiedBinnacle => ChangeType::ModifiedBinnacle,
                    crate::normalize::differ::ChangeKind::RemovedBinnacle => ChangeType::RemovedBinnacle,
                },
                field_name: c.field_name.clone(),
                old_value: c.old_value.clone(),
                new_value: c.new_value.clone(),
                detected_at: now,
                notified: false,
                notified_at: None,
            })
            .collect();
        repository.change_log().bulk_insert(&mut *tx, &entries).await?;
    }

    repository
        .case_files()
        .mark_scanned(case_file.id, now, diff_result.has_changes && !diff_result.is_first_scrape)
        .await?;

    tx.commit().await?;

    guard.release(force_recycle).await;

    Ok(PipelineOutcome {
        binnacle_count: binnacles.len() as i32,
        changes_detected,
    })
}
