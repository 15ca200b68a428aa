//! axum middleware that gates requests on memory pressure.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use tracing::debug;

use crate::domain::GateDecision;
use crate::usecases::GuardedTerminator;
use crate::usecases::MemoryStatsProvider;
use crate::usecases::PressureGate;
use crate::usecases::ports::TerminationContext;
use crate::usecases::ports::TerminationStrategyHandle;

/// Everything the guard needs per request. Cheap to clone.
#[derive(Clone)]
pub struct GuardState {
    stats: Arc<MemoryStatsProvider>,
    gate: PressureGate,
    terminator: Arc<GuardedTerminator>,
    strategy: TerminationStrategyHandle,
    shutdown: Arc<AtomicBool>,
}

impl GuardState {
    pub fn new(
        stats: Arc<MemoryStatsProvider>,
        gate: PressureGate,
        terminator: Arc<GuardedTerminator>,
        strategy: TerminationStrategyHandle,
    ) -> Self {
        Self {
            stats,
            gate,
            terminator,
            strategy,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares `flag` as the cancellation flag of every termination context
    /// this guard creates. Once set, strategies see a cancelled context.
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn stats(&self) -> &Arc<MemoryStatsProvider> {
        &self.stats
    }

    pub fn gate(&self) -> PressureGate {
        self.gate
    }

    pub fn terminator(&self) -> &Arc<GuardedTerminator> {
        &self.terminator
    }
}

/// Use with `axum::middleware::from_fn_with_state`.
pub async fn guard(State(state): State<GuardState>, request: Request, next: Next) -> Response {
    // Reads procfs inline; a throttled provider keeps this off most requests.
    let pressure = state.stats.pressure();
    let decision = state.gate.evaluate(pressure);
    if decision == GateDecision::Terminate {
        let ctx = TerminationContext::new(pressure, state.gate.threshold())
            .with_cancellation(Arc::clone(&state.shutdown));
        let outcome = state.terminator.trigger(Arc::clone(&state.strategy), ctx);
        debug!(
            pressure,
            outcome = ?outcome,
            path = %request.uri().path(),
            "Memory pressure exceeded; request forwarded"
        );
    }
    if !decision.forwards_request() {
        debug!(
            pressure,
            threshold = state.gate.threshold(),
            path = %request.uri().path(),
            "Rejecting request under memory pressure"
        );
        return service_unavailable();
    }
    next.run(request).await
}

fn service_unavailable() -> Response {
    let status = StatusCode::SERVICE_UNAVAILABLE;
    let reason = status.canonical_reason().unwrap_or("Service Unavailable");
    (status, reason).into_response()
}
