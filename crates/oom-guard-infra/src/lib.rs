#![deny(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Infrastructure adapters crate.

pub mod infra;
pub use infra::*;

pub mod common {
    pub use oom_guard_common::common::*;
}

pub mod domain {
    pub use oom_guard_domain::domain::*;
}

pub mod usecases {
    pub use oom_guard_usecases::usecases::*;
}
