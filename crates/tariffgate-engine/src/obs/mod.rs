//! Lightweight in-process metrics (dependency-free).
//!
//! Decisions, holds and releases are counted as atomics and rendered by the
//! `/metrics` handler of the control API.

pub mod metrics;

pub use metrics::EngineMetrics;
