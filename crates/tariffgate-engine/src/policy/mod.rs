//! Policy layer: the country -> tariff rule table and its file representation.
//!
//! The store is read on every response and written by the control surface;
//! see [`PolicyStore`] for the synchronization model.

pub mod persist;
pub mod store;

pub use store::{PolicyStore, RuleTable};
