//! Per-response decision: classify the source, consult the tariff table.

pub mod engine;

pub use engine::{Assessment, DecisionEngine};
