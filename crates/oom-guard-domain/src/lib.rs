#![deny(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Domain types shared by every layer of oom-guard.

pub mod domain;
pub use domain::*;
