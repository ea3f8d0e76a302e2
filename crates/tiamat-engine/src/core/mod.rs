//! Application-facing contracts.
//!
//! Defines the stable interface between the runtime (platform loop) and user
//! code, without leaking runtime internals.

mod app;

pub use app::{App, AppControl};
