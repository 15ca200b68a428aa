#![expect(
    clippy::unwrap_used,
    reason = "Test-only assertions use unwrap for clarity."
)]

//! Request-level tests for the memory guard middleware.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use oom_guard::build_router;
use oom_guard::domain::PressureAction;
use oom_guard::domain::PressureMetric;
use oom_guard::middleware::GuardState;
use oom_guard::usecases::GuardedTerminator;
use oom_guard::usecases::MemoryStatsProvider;
use oom_guard::usecases::PressureGate;
use oom_guard::usecases::ports::test_support::CountingStrategy;
use oom_guard::usecases::ports::test_support::InlineSpawner;
use oom_guard::usecases::ports::test_support::ManualClock;
use oom_guard::usecases::ports::test_support::RefusingSpawner;
use oom_guard::usecases::ports::test_support::StubReportSource;
use oom_guard::usecases::ports::TaskSpawner;
use tower::ServiceExt;

const TOTAL_KB: u64 = 1_048_576;

struct Harness {
    source: Arc<StubReportSource>,
    strategy: Arc<CountingStrategy>,
    terminator: Arc<GuardedTerminator>,
    state: GuardState,
}

impl Harness {
    fn new(used_fraction: f64, threshold: f64, action: PressureAction) -> Self {
        Self::with_spawner(used_fraction, threshold, action, Arc::new(InlineSpawner))
    }

    fn with_spawner(
        used_fraction: f64,
        threshold: f64,
        action: PressureAction,
        spawner: Arc<dyn TaskSpawner>,
    ) -> Self {
        let source = Arc::new(StubReportSource::with_kb(TOTAL_KB, available_kb(used_fraction)));
        let stats = Arc::new(MemoryStatsProvider::new(
            source.clone(),
            Arc::new(ManualClock::new()),
        ));
        let strategy = Arc::new(CountingStrategy::succeeding());
        let terminator = Arc::new(GuardedTerminator::new(spawner));
        let state = GuardState::new(
            stats,
            PressureGate::new(threshold, action),
            Arc::clone(&terminator),
            strategy.clone(),
        );
        Self {
            source,
            strategy,
            terminator,
            state,
        }
    }

    fn set_used_fraction(&self, used_fraction: f64) {
        self.source.set_report(format!(
            "MemTotal: {TOTAL_KB} kB\nMemAvailable: {} kB\n",
            available_kb(used_fraction)
        ));
    }

    async fn get(&self, path: &str) -> (StatusCode, String) {
        let response = build_router(self.state.clone())
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }
}

fn available_kb(used_fraction: f64) -> u64 {
    ((1.0 - used_fraction) * TOTAL_KB as f64) as u64
}

#[tokio::test]
async fn test_allows_request_below_threshold() {
    let harness = Harness::new(0.5, 0.9, PressureAction::Reject);

    let (status, body) = harness.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert_eq!(harness.strategy.attempts(), 0);
}

#[tokio::test]
async fn test_rejects_with_503_above_threshold() {
    let harness = Harness::new(0.95, 0.9, PressureAction::Reject);

    let (status, body) = harness.get("/").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Service Unavailable");
    assert_eq!(harness.strategy.attempts(), 0);
    assert!(!harness.terminator.is_terminating());
}

#[tokio::test]
async fn test_reject_clears_once_pressure_drops() {
    let harness = Harness::new(0.95, 0.9, PressureAction::Reject);

    let (rejected, _) = harness.get("/").await;
    harness.set_used_fraction(0.25);
    let (allowed, _) = harness.get("/").await;

    assert_eq!(rejected, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(allowed, StatusCode::OK);
}

#[tokio::test]
async fn test_selfdestruct_triggers_and_forwards() {
    let harness = Harness::new(0.95, 0.9, PressureAction::SelfDestruct);

    let (status, body) = harness.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert_eq!(harness.strategy.attempts(), 1);
    assert!(harness.terminator.is_terminating());
    let fraction = harness.strategy.last_fraction().unwrap();
    assert!(fraction > 0.9);
}

#[tokio::test]
async fn test_selfdestruct_runs_strategy_once_across_requests() {
    let harness = Harness::new(0.95, 0.9, PressureAction::SelfDestruct);

    for _ in 0..5 {
        let (status, _) = harness.get("/").await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(harness.strategy.attempts(), 1);
}

#[tokio::test]
async fn test_failed_selfdestruct_rearms_for_next_request() {
    let harness = Harness::new(0.95, 0.9, PressureAction::SelfDestruct);
    harness.strategy.set_succeed(false);

    harness.get("/").await;
    harness.get("/").await;

    assert_eq!(harness.strategy.attempts(), 2);
    assert!(!harness.terminator.is_terminating());
}

#[tokio::test]
async fn test_refused_spawn_still_forwards_request() {
    let harness = Harness::with_spawner(
        0.95,
        0.9,
        PressureAction::SelfDestruct,
        Arc::new(RefusingSpawner),
    );

    let (status, _) = harness.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.strategy.attempts(), 0);
    assert!(!harness.terminator.is_terminating());
}

#[tokio::test]
async fn test_unreadable_report_fails_open() {
    let harness = Harness::new(0.5, 0.1, PressureAction::Reject);
    harness.source.fail_with(std::io::ErrorKind::PermissionDenied);

    let (status, _) = harness.get("/").await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_memory_endpoint_reports_snapshot() {
    let harness = Harness::new(0.25, 0.9, PressureAction::Reject);

    let (status, body) = harness.get("/memory").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_bytes"], TOTAL_KB * 1024);
    assert_eq!(json["used_fraction"], 0.25);
    assert_eq!(json["metric"], "system");
    assert_eq!(json["pressure"], 0.25);
    assert_eq!(json["threshold"], 0.9);
    assert_eq!(json["action"], "reject");
    assert_eq!(json["terminating"], false);
}

#[tokio::test]
async fn test_selfdestruct_during_shutdown_sees_cancelled_context() {
    let harness = Harness::new(0.95, 0.9, PressureAction::SelfDestruct);
    harness.state.shutdown_flag().store(true, Ordering::SeqCst);

    let (status, _) = harness.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.strategy.attempts(), 1);
    assert_eq!(harness.strategy.last_cancelled(), Some(true));
}

#[tokio::test]
async fn test_selfdestruct_before_shutdown_is_not_cancelled() {
    let harness = Harness::new(0.95, 0.9, PressureAction::SelfDestruct);

    harness.get("/").await;

    assert_eq!(harness.strategy.last_cancelled(), Some(false));
}

#[tokio::test]
async fn test_shared_shutdown_flag_reaches_strategy() {
    let flag = Arc::new(AtomicBool::new(false));
    let mut harness = Harness::new(0.95, 0.9, PressureAction::SelfDestruct);
    harness.state = harness.state.clone().with_shutdown_flag(Arc::clone(&flag));
    harness.strategy.set_succeed(false);

    harness.get("/").await;
    flag.store(true, Ordering::SeqCst);
    harness.get("/").await;

    assert_eq!(harness.strategy.attempts(), 2);
    assert_eq!(harness.strategy.last_cancelled(), Some(true));
}

fn process_state(resident_fraction: f64, system_fraction: f64, threshold: f64) -> GuardState {
    let report = format!(
        "MemTotal: {TOTAL_KB} kB\nMemAvailable: {} kB\nVmRSS: {} kB\n",
        available_kb(system_fraction),
        (resident_fraction * TOTAL_KB as f64) as u64
    );
    let stats = MemoryStatsProvider::new(
        Arc::new(StubReportSource::new(report)),
        Arc::new(ManualClock::new()),
    )
    .with_metric(PressureMetric::Process);
    GuardState::new(
        Arc::new(stats),
        PressureGate::new(threshold, PressureAction::Reject),
        Arc::new(GuardedTerminator::new(Arc::new(InlineSpawner))),
        Arc::new(CountingStrategy::succeeding()),
    )
}

async fn status_of(state: GuardState, path: &str) -> (StatusCode, String) {
    let response = build_router(state)
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_process_metric_rejects_on_resident_set() {
    let (status, _) = status_of(process_state(0.6, 0.1, 0.5), "/").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_process_metric_ignores_system_usage() {
    let state = process_state(0.25, 0.95, 0.5);

    let (status, _) = status_of(state.clone(), "/").await;
    let (_, body) = status_of(state, "/memory").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metric"], "process");
    assert_eq!(json["pressure"], 0.25);
}
