//! tariffgate core: runtime-free domain types and the shared error surface.
//!
//! This crate defines country codes, tariff rules, decisions and retained-flow
//! records used by the engine, the control surface and host integrations. It
//! carries no async runtime or transport dependencies so hosts can reuse the
//! types without pulling in tokio.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `TariffError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod country;
pub mod decision;
pub mod error;
pub mod flow;
pub mod rule;

pub use country::CountryCode;
pub use decision::Decision;
/// Shared result type.
pub use error::{ErrorCode, Result, TariffError};
pub use flow::{FlowId, FlowMeta, RetainStatus, RetainedFlow};
pub use rule::TariffRule;
