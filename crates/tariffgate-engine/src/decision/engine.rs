use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tariffgate_core::{CountryCode, Decision, FlowId};

use crate::geo::GeoClassifier;
use crate::obs::EngineMetrics;
use crate::policy::PolicyStore;

/// Decision plus the country it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub source_country: Option<CountryCode>,
    pub decision: Decision,
}

impl Assessment {
    fn unresolved() -> Self {
        Self {
            source_country: None,
            decision: Decision::Pass,
        }
    }
}

/// Geo lookup + tariff lookup. Holds no per-flow state.
pub struct DecisionEngine {
    policy: Arc<PolicyStore>,
    geo: Arc<dyn GeoClassifier>,
    metrics: Arc<EngineMetrics>,
}

impl DecisionEngine {
    pub fn new(policy: Arc<PolicyStore>, geo: Arc<dyn GeoClassifier>, metrics: Arc<EngineMetrics>) -> Self {
        Self { policy, geo, metrics }
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    /// Decide what to do with one response.
    pub fn evaluate(&self, flow_id: &FlowId, source_ip: IpAddr, round_trip_time: Duration) -> Decision {
        self.assess(flow_id, source_ip, round_trip_time).decision
    }

    /// Same as [`evaluate`](Self::evaluate) but also reports the resolved country.
    ///
    /// Resolver errors and unknown countries both mean "no country": the flow
    /// passes regardless of the table.
    pub fn assess(&self, flow_id: &FlowId, source_ip: IpAddr, round_trip_time: Duration) -> Assessment {
        let country = match self.geo.resolve(source_ip) {
            Ok(Some(c)) => c,
            Ok(None) => {
                tracing::debug!(flow_id = %flow_id, %source_ip, "no country for source; pass");
                self.metrics.geo_unresolved.inc(&[("reason", "unknown")]);
                return self.record(Assessment::unresolved());
            }
            Err(e) => {
                tracing::debug!(flow_id = %flow_id, %source_ip, error = %e, "geo lookup failed; pass");
                self.metrics.geo_unresolved.inc(&[("reason", "error")]);
                return self.record(Assessment::unresolved());
            }
        };

        let decision = match self.policy.get(&country) {
            None => Decision::Pass,
            Some(rule) if rule.dropped => Decision::Drop,
            Some(rule) => Decision::Hold(rule.hold_for(round_trip_time)),
        };

        match decision {
            Decision::Hold(d) => tracing::debug!(
                flow_id = %flow_id, %country, hold_ms = d.as_millis() as u64, "hold"
            ),
            other => tracing::debug!(flow_id = %flow_id, %country, decision = other.as_str(), "decided"),
        }

        self.record(Assessment {
            source_country: Some(country),
            decision,
        })
    }

    fn record(&self, a: Assessment) -> Assessment {
        self.metrics.decisions.inc(&[("decision", a.decision.as_str())]);
        a
    }
}
