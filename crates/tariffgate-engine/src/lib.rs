//! tariffgate engine library entry.
//!
//! Wires the tariff table, the geolocation seam, the decision engine and the
//! retention scheduler into one state object a host can drive, plus a small
//! HTTP control API. Consumed by the binary (`main.rs`), by host
//! integrations, and by integration tests.

pub mod app_state;
pub mod config;
pub mod control;
pub mod decision;
pub mod geo;
pub mod host;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod retention;
pub mod router;

pub use app_state::{AppState, ResponseEvent};
pub use decision::{Assessment, DecisionEngine};
pub use geo::{GeoClassifier, StaticGeoTable};
pub use host::{ChannelHost, FlowHost, HostSignal, TracingHost};
pub use policy::PolicyStore;
pub use retention::RetentionScheduler;
