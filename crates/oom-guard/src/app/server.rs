//! Demo HTTP server wired behind the memory guard.

use std::sync::Arc;
#[cfg(not(unix))]
use std::sync::atomic::AtomicBool;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::info;

use crate::app::error::ServerError;
use crate::domain::MemorySnapshot;
use crate::domain::SignalScope;
use crate::infra::GuardConfig;
use crate::infra::SystemClock;
use crate::infra::report_source_for;
use crate::middleware::GuardState;
use crate::middleware::guard;
use crate::usecases::GuardedTerminator;
use crate::usecases::MemoryStatsProvider;
use crate::usecases::PressureGate;
use crate::usecases::ports::TaskSpawner;
use crate::usecases::ports::TerminationStrategyHandle;

#[derive(Debug, Clone)]
pub struct ServeOptions {
    listen: String,
    config: GuardConfig,
}

impl ServeOptions {
    pub fn new(listen: impl Into<String>, config: GuardConfig) -> Self {
        Self {
            listen: listen.into(),
            config,
        }
    }

    pub fn listen(&self) -> &str {
        &self.listen
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

#[derive(Debug, Serialize)]
struct MemoryReport {
    #[serde(flatten)]
    snapshot: MemorySnapshot,
    metric: &'static str,
    pressure: f64,
    threshold: f64,
    action: &'static str,
    terminating: bool,
}

/// Guard over the platform memory report with its own refresh throttle.
pub fn build_guard_state(config: &GuardConfig, spawner: Arc<dyn TaskSpawner>) -> GuardState {
    let stats = MemoryStatsProvider::new(report_source_for(config.metric()), Arc::new(SystemClock))
        .with_metric(config.metric())
        .with_update_interval(config.refresh_interval());
    GuardState::new(
        Arc::new(stats),
        PressureGate::new(config.threshold(), config.action()),
        Arc::new(GuardedTerminator::new(spawner)),
        default_strategy(config.signal_scope()),
    )
}

#[cfg(unix)]
fn default_strategy(scope: SignalScope) -> TerminationStrategyHandle {
    Arc::new(crate::infra::SignalStrategy::new(scope))
}

#[cfg(not(unix))]
fn default_strategy(scope: SignalScope) -> TerminationStrategyHandle {
    Arc::new(move |_ctx: &crate::usecases::ports::TerminationContext| {
        tracing::warn!(%scope, "Signal termination is not supported on this platform");
        false
    })
}

pub fn build_router(state: GuardState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/memory", get(memory_handler))
        .layer(axum::middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "ok"
}

async fn memory_handler(State(state): State<GuardState>) -> Json<MemoryReport> {
    let gate = state.gate();
    let stats = state.stats();
    Json(MemoryReport {
        snapshot: stats.snapshot(),
        metric: stats.metric().as_str(),
        pressure: stats.pressure(),
        threshold: gate.threshold(),
        action: gate.action().as_str(),
        terminating: state.terminator().is_terminating(),
    })
}

pub(crate) async fn serve(options: ServeOptions, state: GuardState) -> Result<(), ServerError> {
    let listener = TcpListener::bind(options.listen())
        .await
        .map_err(ServerError::io("bind"))?;
    let local_addr = listener.local_addr().map_err(ServerError::io("local_addr"))?;

    let shutdown = Arc::new(Notify::new());
    let _signals = install_shutdown_signals(state.shutdown_flag(), Arc::clone(&shutdown))?;

    let config = options.config();
    info!(
        addr = %local_addr,
        threshold = config.threshold(),
        action = %config.action(),
        signal_scope = %config.signal_scope(),
        metric = %config.metric(),
        refresh_interval_ms = config.refresh_interval().as_millis() as u64,
        "Serving behind memory guard"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await
        .map_err(ServerError::io("serve"))?;

    info!("Server stopped");
    Ok(())
}

#[cfg(unix)]
fn install_shutdown_signals(
    flag: Arc<std::sync::atomic::AtomicBool>,
    shutdown: Arc<Notify>,
) -> Result<crate::infra::ShutdownSignals, ServerError> {
    let notifier: crate::infra::ShutdownNotifier = Box::new(move || shutdown.notify_one());
    Ok(crate::infra::ShutdownSignals::setup(flag, Some(notifier))?)
}

#[cfg(not(unix))]
fn install_shutdown_signals(
    flag: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) -> Result<(), ServerError> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, initiating graceful shutdown");
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            shutdown.notify_one();
        }
    });
    Ok(())
}
