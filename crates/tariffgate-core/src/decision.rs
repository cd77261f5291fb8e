//! Per-flow shaping decision.

use std::time::Duration;

/// Outcome of evaluating one response against the tariff table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Deliver immediately; no rule applies.
    Pass,
    /// Discard the flow.
    Drop,
    /// Delay delivery for the given duration. `Hold(ZERO)` is kept distinct
    /// from `Pass` so zero-rate rules still show up in the audit table.
    Hold(Duration),
}

impl Decision {
    pub fn is_pass(&self) -> bool {
        matches!(self, Decision::Pass)
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, Decision::Drop)
    }

    /// Hold duration, if this is a hold.
    pub fn hold(&self) -> Option<Duration> {
        match self {
            Decision::Hold(d) => Some(*d),
            _ => None,
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Pass => "pass",
            Decision::Drop => "drop",
            Decision::Hold(_) => "hold",
        }
    }
}
