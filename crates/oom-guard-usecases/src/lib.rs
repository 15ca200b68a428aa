#![deny(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Use-case orchestration crate: memory stats caching, the pressure gate and
//! the termination coordinator, written against ports only.

pub mod usecases;
pub use usecases::*;

pub mod common {
    pub use oom_guard_common::common::*;
}

pub mod domain {
    pub use oom_guard_domain::domain::*;
}
