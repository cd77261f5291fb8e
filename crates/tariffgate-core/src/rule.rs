//! Per-country tariff rule.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::country::CountryCode;
use crate::error::{Result, TariffError};

/// Policy for one country.
///
/// `rate` multiplies the round-trip time of a matching flow to give its hold
/// duration. When `dropped` is set the rate is ignored and matching flows are
/// discarded. This is also the persisted `{country_code, rate, dropped}` shape;
/// `rate` may only be left out of that shape when `dropped` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleRepr")]
pub struct TariffRule {
    pub country_code: CountryCode,
    pub rate: f64,
    pub dropped: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleRepr {
    country_code: CountryCode,
    #[serde(default)]
    rate: Option<f64>,
    #[serde(default)]
    dropped: bool,
}

impl TryFrom<RuleRepr> for TariffRule {
    type Error = TariffError;

    fn try_from(r: RuleRepr) -> Result<Self> {
        let rate = required_rate(&r.country_code, r.rate, r.dropped)?;
        Ok(Self {
            country_code: r.country_code,
            rate,
            dropped: r.dropped,
        })
    }
}

fn required_rate(country_code: &CountryCode, rate: Option<f64>, dropped: bool) -> Result<f64> {
    match rate {
        Some(rate) => Ok(rate),
        None if dropped => Ok(0.0),
        None => Err(TariffError::InvalidRule(format!(
            "rate for {country_code} is required unless the rule drops"
        ))),
    }
}

impl TariffRule {
    /// Build a validated rule from raw control-plane input.
    pub fn new(country_code: &str, rate: f64, dropped: bool) -> Result<Self> {
        let country_code = CountryCode::parse(country_code)?;
        let rule = Self {
            country_code,
            rate,
            dropped,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Like [`new`](Self::new), for input where `rate` is optional.
    /// A missing rate is only accepted on a dropped rule.
    pub fn from_parts(country_code: &str, rate: Option<f64>, dropped: bool) -> Result<Self> {
        let country_code = CountryCode::parse(country_code)?;
        let rule = Self {
            rate: required_rate(&country_code, rate, dropped)?,
            country_code,
            dropped,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Re-check invariants (deserialized rules bypass `new`).
    pub fn validate(&self) -> Result<()> {
        if !self.rate.is_finite() {
            return Err(TariffError::InvalidRule(format!(
                "rate for {} must be finite",
                self.country_code
            )));
        }
        if self.rate < 0.0 {
            return Err(TariffError::InvalidRule(format!(
                "rate for {} must not be negative (got {})",
                self.country_code, self.rate
            )));
        }
        Ok(())
    }

    /// Hold duration for a flow with the given round-trip time.
    ///
    /// Computed in nanoseconds and rounded; the float-to-int cast saturates,
    /// so the result is never negative and never panics.
    pub fn hold_for(&self, round_trip_time: Duration) -> Duration {
        let nanos = round_trip_time.as_nanos() as f64 * self.rate;
        Duration::from_nanos(nanos.round() as u64)
    }
}
