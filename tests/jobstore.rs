//! Integration tests for the durable job queue (spec.md §4.2).

use std::time::Duration;

use portal_watch::clock::Clock;
use portal_watch::error::ErrorKind;
use portal_watch::jobstore::{JobPayload, JobRateLimiter, JobStore, Lane};
use sqlx::PgPool;
use uuid::Uuid;

const ALL_LANES: &[Lane] = &[Lane::Priority, Lane::Initial, Lane::Monitor];

/// `clock::test_support::FixedClock` is `#[cfg(test)]`-gated inside the
/// library, which only applies to the library's own unit tests, not to
/// this external integration test binary. A local stand-in avoids needing
/// `now()` to be anything but deterministic-enough for dedup-key math.
struct FixedClock(chrono::DateTime<chrono::Utc>);

impl Clock for FixedClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.0
    }
    fn tz(&self) -> chrono_tz::Tz {
        chrono_tz::UTC
    }
}

fn unthrottled_store(pool: PgPool) -> JobStore {
    // A wide-open bucket so tests aren't slowed by the production 10/60s quota.
    let rate_limiter = std::sync::Arc::new(JobRateLimiter::new(10_000, Duration::from_secs(1)));
    JobStore::new(pool, rate_limiter)
}

fn payload(case_file_id: Uuid) -> JobPayload {
    JobPayload {
        case_file_id,
        tenant_id: Uuid::new_v4(),
        case_number: "12345-2024-0-1801-JR-CI-01".to_string(),
    }
}

#[sqlx::test]
async fn enqueue_then_next_ready_returns_it(pool: PgPool) {
    let store = unthrottled_store(pool);
    let clock = FixedClock(chrono::Utc::now());

    let case_file_id = Uuid::new_v4();
    let job_id = store
        .enqueue(Lane::Monitor, payload(case_file_id), 0, &clock)
        .await
        .unwrap()
        .expect("first enqueue for this dedup key should succeed");

    let job = store
        .next_ready("worker-0", ALL_LANES)
        .await
        .unwrap()
        .expect("the enqueued job should be ready");

    assert_eq!(job.id, job_id);
    assert_eq!(job.lane, Lane::Monitor);
    assert_eq!(job.attempt, 1, "next_ready increments attempt on claim");
}

#[sqlx::test]
async fn duplicate_dedup_key_is_a_noop(pool: PgPool) {
    let store = unthrottled_store(pool);
    let clock = FixedClock(chrono::Utc::now());
    let case_file_id = Uuid::new_v4();

    let first = store
        .enqueue(Lane::Monitor, payload(case_file_id), 0, &clock)
        .await
        .unwrap();
    assert!(first.is_some());

    let second = store
        .enqueue(Lane::Monitor, payload(case_file_id), 0, &clock)
        .await
        .unwrap();
    assert!(
        second.is_none(),
        "a second enqueue with the same lane/case_file/day must be a no-op"
    );
}

#[sqlx::test]
async fn lane_poll_order_is_priority_then_initial_then_monitor(pool: PgPool) {
    let store = unthrottled_store(pool);
    let clock = FixedClock(chrono::Utc::now());

    store
        .enqueue(Lane::Monitor, payload(Uuid::new_v4()), 0, &clock)
        .await
        .unwrap();
    store
        .enqueue(Lane::Initial, payload(Uuid::new_v4()), 0, &clock)
        .await
        .unwrap();
    store
        .enqueue(Lane::Priority, payload(Uuid::new_v4()), 0, &clock)
        .await
        .unwrap();

    let first = store.next_ready("worker-0", ALL_LANES).await.unwrap().unwrap();
    assert_eq!(first.lane, Lane::Priority);

    let second = store.next_ready("worker-0", ALL_LANES).await.unwrap().unwrap();
    assert_eq!(second.lane, Lane::Initial);

    let third = store.next_ready("worker-0", ALL_LANES).await.unwrap().unwrap();
    assert_eq!(third.lane, Lane::Monitor);

    assert!(store.next_ready("worker-0", ALL_LANES).await.unwrap().is_none());
}

#[sqlx::test]
async fn empty_queue_returns_none(pool: PgPool) {
    let store = unthrottled_store(pool);
    assert!(store.next_ready("worker-0", ALL_LANES).await.unwrap().is_none());
}

#[sqlx::test]
async fn fail_with_retryable_kind_reschedules(pool: PgPool) {
    let store = unthrottled_store(pool);
    let clock = FixedClock(chrono::Utc::now());

    store
        .enqueue(Lane::Monitor, payload(Uuid::new_v4()), 0, &clock)
        .await
        .unwrap();
    let job = store.next_ready("worker-0", ALL_LANES).await.unwrap().unwrap();

    let outcome = store
        .fail(&job, ErrorKind::PortalUnreachable, "connection reset", 0.0)
        .await
        .unwrap();

    match outcome {
        portal_watch::jobstore::FailOutcome::Retrying { run_at } => {
            assert!(run_at > chrono::Utc::now());
        }
        portal_watch::jobstore::FailOutcome::Exhausted => {
            panic!("a first-attempt retryable failure should reschedule, not exhaust")
        }
    }

    // The job is visible again once its run_at passes; it isn't claimable yet.
    assert!(store.next_ready("worker-0", ALL_LANES).await.unwrap().is_none());
}

#[sqlx::test]
async fn fail_with_non_retryable_kind_is_terminal(pool: PgPool) {
    let store = unthrottled_store(pool);
    let clock = FixedClock(chrono::Utc::now());

    store
        .enqueue(Lane::Monitor, payload(Uuid::new_v4()), 0, &clock)
        .await
        .unwrap();
    let job = store.next_ready("worker-0", ALL_LANES).await.unwrap().unwrap();

    let outcome = store
        .fail(&job, ErrorKind::InvalidCaseNumber, "case not found", 0.0)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        portal_watch::jobstore::FailOutcome::Exhausted
    ));
}

#[sqlx::test]
async fn complete_marks_job_completed_in_lane_counts(pool: PgPool) {
    let store = unthrottled_store(pool);
    let clock = FixedClock(chrono::Utc::now());

    store
        .enqueue(Lane::Priority, payload(Uuid::new_v4()), 0, &clock)
        .await
        .unwrap();
    let job = store.next_ready("worker-0", ALL_LANES).await.unwrap().unwrap();
    store.complete(job.id).await.unwrap();

    let counts = store.lane_counts().await.unwrap();
    assert!(counts.iter().any(|(lane, state, n)| {
        *lane == Lane::Priority && *state == portal_watch::jobstore::JobState::Completed && *n == 1
    }));
}

#[sqlx::test]
async fn recover_stale_resets_active_jobs_to_pending(pool: PgPool) {
    let store = unthrottled_store(pool);
    let clock = FixedClock(chrono::Utc::now());

    store
        .enqueue(Lane::Monitor, payload(Uuid::new_v4()), 0, &clock)
        .await
        .unwrap();
    // Claim it, simulating the state left behind by a process that died
    // mid-job without calling complete/fail.
    store.next_ready("worker-0", ALL_LANES).await.unwrap().unwrap();

    let recovered = store.recover_stale().await.unwrap();
    assert_eq!(recovered, 1);

    let job = store
        .next_ready("worker-1", ALL_LANES)
        .await
        .unwrap()
        .expect("recovered job should be claimable again");
    assert_eq!(job.attempt, 2, "second claim bumps attempt again (1 -> 2)");
}
