//! Inbound control API (spec.md §6): `POST /jobs/initial`, `POST
//! /jobs/priority`, `GET /health`, `GET /metrics`, `GET /status`.
//! Router/middleware layering (compression, tracing, timeout) follows the
//! teacher's `create_router`, trimmed of the course-search/admin/RMP/Discord
//! surface that has no counterpart here.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Router, body::Body};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::{
    classify::ServerErrorsFailureClass, compression::CompressionLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{Span, debug, trace, warn};
use uuid::Uuid;

use crate::jobstore::{JobPayload, Lane};
use crate::web::auth::RequireBearerAuth;
use crate::web::state::WebState;

pub fn create_router(state: WebState) -> Router {
    let router = Router::new()
        .route("/jobs/initial", post(enqueue_initial))
        .route("/jobs/priority", post(enqueue_priority))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/status", get(status))
        .with_state(state);

    router.layer((
        CompressionLayer::new()
            .zstd(true)
            .br(true)
            .gzip(true)
            .quality(tower_http::CompressionLevel::Fastest),
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                tracing::debug_span!("request", path = request.uri().path())
            })
            .on_request(())
            .on_body_chunk(())
            .on_eos(())
            .on_response(
                |response: &Response<Body>, latency: Duration, _span: &Span| {
                    let latency_threshold = if cfg!(debug_assertions) {
                        Duration::from_millis(100)
                    } else {
                        Duration::from_millis(1000)
                    };
                    let line = format!(
                        "{} {}",
                        response.status().as_u16(),
                        response.status().canonical_reason().unwrap_or("??")
                    );
                    if latency > latency_threshold {
                        warn!(latency = format!("{latency:.2?}"), status = line, "response");
                    } else {
                        debug!(latency = format!("{latency:.2?}"), status = line, "response");
                    }
                },
            )
            .on_failure(
                |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                    warn!(error = ?error, latency = format!("{latency:.2?}"), "request failed");
                },
            ),
        TimeoutLayer::new(Duration::from_secs(10)),
    ))
}

#[derive(Debug, Deserialize)]
struct EnqueueRequest {
    case_file_id: Uuid,
    case_number: String,
    tenant_id: Uuid,
}

#[derive(Debug, Serialize)]
struct EnqueueResponse {
    job_id: Option<Uuid>,
}

async fn enqueue(state: &WebState, lane: Lane, body: EnqueueRequest) -> Response {
    if body.case_number.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "caseNumber must not be empty" })),
        )
            .into_response();
    }

    let payload = JobPayload {
        case_file_id: body.case_file_id,
        tenant_id: body.tenant_id,
        case_number: body.case_number,
    };

    // Priority jobs never dedup (spec.md §4.2); Initial jobs dedup per day
    // like Monitor. Both always enqueue at the highest priority (spec.md
    // §4.3).
    match state
        .job_store
        .enqueue(lane, payload, crate::scheduler::priority::ALWAYS_HIGHEST, state.clock.as_ref())
        .await
    {
        Ok(job_id) => (StatusCode::ACCEPTED, Json(EnqueueResponse { job_id })).into_response(),
        Err(e) => {
            warn!(error = ?e, ?lane, "failed to enqueue job");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to enqueue job" })),
            )
                .into_response()
        }
    }
}

/// `POST /jobs/initial` — bearer-authenticated.
async fn enqueue_initial(
    State(state): State<WebState>,
    _auth: RequireBearerAuth,
    Json(body): Json<EnqueueRequest>,
) -> Response {
    enqueue(&state, Lane::Initial, body).await
}

/// `POST /jobs/priority` — bearer-authenticated.
async fn enqueue_priority(
    State(state): State<WebState>,
    _auth: RequireBearerAuth,
    Json(body): Json<EnqueueRequest>,
) -> Response {
    enqueue(&state, Lane::Priority, body).await
}

#[derive(Serialize)]
struct HealthChecks {
    database: bool,
    queue_store: bool,
    browser_pool: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    checks: HealthChecks,
}

/// `GET /health` — unauthenticated (spec.md §6).
async fn health(State(state): State<WebState>) -> Response {
    trace!("health check requested");

    let database = state.repository.health_check().await.is_ok();
    // The JobStore and Repository share one Postgres pool, so a database
    // check that passes implies the queue store is reachable too.
    let queue_store = database;
    let browser_pool = state.browser_pool.stats().await.size > 0;

    let checks = HealthChecks {
        database,
        queue_store,
        browser_pool,
    };
    let healthy = database && queue_store && browser_pool;

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        uptime_secs: state.started_at.elapsed().as_secs(),
        checks,
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(body)).into_response()
}

/// `GET /metrics` — unauthenticated; text counters (spec.md §6).
async fn metrics(State(state): State<WebState>) -> Response {
    let lane_counts = state.job_store.lane_counts().await.unwrap_or_default();

    let mut out = String::new();
    out.push_str("# HELP portal_watch_jobs Job counts by lane and state.\n");
    out.push_str("# TYPE portal_watch_jobs gauge\n");
    for (lane, job_state, count) in &lane_counts {
        out.push_str(&format!(
            "portal_watch_jobs{{lane=\"{:?}\",state=\"{:?}\"}} {}\n",
            lane, job_state, count
        ));
    }

    let pool_stats = state.browser_pool.stats().await;
    out.push_str("# HELP portal_watch_browser_pool_in_use Browser sessions currently checked out.\n");
    out.push_str("# TYPE portal_watch_browser_pool_in_use gauge\n");
    out.push_str(&format!("portal_watch_browser_pool_in_use {}\n", pool_stats.in_use));
    out.push_str("# HELP portal_watch_browser_pool_size Total browser pool capacity.\n");
    out.push_str("# TYPE portal_watch_browser_pool_size gauge\n");
    out.push_str(&format!("portal_watch_browser_pool_size {}\n", pool_stats.size));

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        out,
    )
        .into_response()
}

#[derive(Serialize)]
struct LaneStatus {
    lane: String,
    state: String,
    count: i64,
}

#[derive(Serialize)]
struct BrowserPoolStatus {
    size: usize,
    in_use: usize,
    available: usize,
}

#[derive(Serialize)]
struct StatusResponse {
    lanes: Vec<LaneStatus>,
    browser_pool: BrowserPoolStatus,
    services: Value,
}

/// `GET /status` — bearer-authenticated (spec.md §6).
async fn status(State(state): State<WebState>, _auth: RequireBearerAuth) -> Result<Json<StatusResponse>, Response> {
    let lane_counts = state.job_store.lane_counts().await.map_err(|e| {
        warn!(error = ?e, "failed to read lane counts for status");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "failed to read job store status" })),
        )
            .into_response()
    })?;

    let lanes = lane_counts
        .into_iter()
        .map(|(lane, job_state, count)| LaneStatus {
            lane: format!("{lane:?}"),
            state: format!("{job_state:?}"),
            count,
        })
        .collect();

    let pool_stats = state.browser_pool.stats().await;
    let services: std::collections::BTreeMap<String, String> = state
        .service_statuses
        .all()
        .into_iter()
        .map(|(name, svc_status)| (name, format!("{svc_status:?}")))
        .collect();

    Ok(Json(StatusResponse {
        lanes,
        browser_pool: BrowserPoolStatus {
            size: pool_stats.size,
            in_use: pool_stats.in_use,
            available: pool_stats.available,
        },
        services: json!(services),
    }))
}
