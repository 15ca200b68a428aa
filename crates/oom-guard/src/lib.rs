#![deny(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Memory-pressure guard for axum services.
//!
//! Wire [`middleware::guard`] into a router with
//! `axum::middleware::from_fn_with_state` and a [`middleware::GuardState`].
//! Requests above the configured threshold are either rejected with
//! `503 Service Unavailable` or start a single-flight self-termination while
//! still being served.

mod app;
pub mod global;
pub mod middleware;

pub use app::Application;
pub use app::error::ServerError;
pub use app::server::ServeOptions;
pub use app::server::build_guard_state;
pub use app::server::build_router;

pub mod common {
    pub use oom_guard_common::common::*;
}

pub mod domain {
    pub use oom_guard_domain::domain::*;
}

pub mod usecases {
    pub use oom_guard_usecases::usecases::*;
}

pub mod infra {
    pub use oom_guard_infra::infra::*;
}
