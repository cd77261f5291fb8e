//! Retention of held and dropped flows.
//!
//! Held flows wait on a cancellable tokio timer; dropped flows stay as audit
//! records until the table is cleared. Timer expiry, external completion and
//! clear all remove entries through one claim step, so each held flow is
//! released or cancelled exactly once.

pub mod scheduler;

pub use scheduler::RetentionScheduler;
