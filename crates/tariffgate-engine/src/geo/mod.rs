//! Geolocation seam.
//!
//! The engine never owns a geolocation database. Hosts plug one in through
//! [`GeoClassifier`]; [`StaticGeoTable`] is a config-driven prefix table for
//! deployments and tests that do not need a real database.

pub mod prefix_table;

use std::net::IpAddr;

use tariffgate_core::error::Result;
use tariffgate_core::CountryCode;

pub use prefix_table::{GeoPrefix, StaticGeoTable};

/// Source address -> country.
///
/// `Ok(None)` means the resolver knows the address but not its country.
/// Errors (`AddressNotFound`, `Resolution`) are downgraded by the decision
/// engine to "no country", so implementations can report them freely.
pub trait GeoClassifier: Send + Sync {
    fn resolve(&self, ip: IpAddr) -> Result<Option<CountryCode>>;
}

impl<F> GeoClassifier for F
where
    F: Fn(IpAddr) -> Result<Option<CountryCode>> + Send + Sync,
{
    fn resolve(&self, ip: IpAddr) -> Result<Option<CountryCode>> {
        self(ip)
    }
}
