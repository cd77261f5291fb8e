//! Flow identity and retained-flow audit records.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::country::CountryCode;

/// Opaque host-assigned flow identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(String);

impl FlowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FlowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Facts about one response, supplied by the host (plus the classified country).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMeta {
    pub flow_id: FlowId,
    pub request_url: String,
    pub response_size: u64,
    pub source_ip: IpAddr,
    #[serde(default)]
    pub source_country: Option<CountryCode>,
    pub client_ip: IpAddr,
    pub received_at: DateTime<Utc>,
    #[serde(rename = "round_trip_time_ms", with = "millis")]
    pub round_trip_time: Duration,
}

/// Where a retained flow sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetainStatus {
    /// Waiting for its release timer.
    Held,
    /// Discarded; kept only as an audit record.
    Dropped,
}

/// Entry of the retained-flow table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainedFlow {
    #[serde(flatten)]
    pub meta: FlowMeta,
    /// `None` for dropped flows.
    #[serde(rename = "retain_duration_ms", with = "opt_millis", default)]
    pub retain_duration: Option<Duration>,
    pub status: RetainStatus,
}

impl RetainedFlow {
    pub fn held(meta: FlowMeta, retain_duration: Duration) -> Self {
        Self {
            meta,
            retain_duration: Some(retain_duration),
            status: RetainStatus::Held,
        }
    }

    pub fn dropped(meta: FlowMeta) -> Self {
        Self {
            meta,
            retain_duration: None,
            status: RetainStatus::Dropped,
        }
    }

    pub fn flow_id(&self) -> &FlowId {
        &self.meta.flow_id
    }

    pub fn is_held(&self) -> bool {
        self.status == RetainStatus::Held
    }
}

/// Durations as floating-point milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_nanos() as f64 / 1_000_000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(d)?;
        Ok(Duration::from_nanos((ms * 1_000_000.0).round() as u64))
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_nanos() as f64 / 1_000_000.0)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let ms = Option::<f64>::deserialize(d)?;
        Ok(ms.map(|ms| Duration::from_nanos((ms * 1_000_000.0).round() as u64)))
    }
}
