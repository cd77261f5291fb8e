//! Static CIDR prefix table.
//!
//! Entries are `"a.b.c.d/len"` or `"v6::/len"` strings mapped to a country.
//! Lookups pick the longest matching prefix.

use std::net::IpAddr;

use serde::Deserialize;

use tariffgate_core::error::{Result, TariffError};
use tariffgate_core::CountryCode;

use super::GeoClassifier;

/// Raw config entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoPrefix {
    pub prefix: String,
    pub country: String,
}

#[derive(Debug, Clone)]
struct Prefix {
    net: u128,
    len: u8,
    v4: bool,
    country: CountryCode,
}

impl Prefix {
    fn matches(&self, v4: bool, addr: u128) -> bool {
        if self.v4 != v4 {
            return false;
        }
        let width = if v4 { 32 } else { 128 };
        let shift = width - u32::from(self.len);
        if shift >= 128 {
            return true;
        }
        (addr >> shift) == (self.net >> shift)
    }
}

fn addr_bits(ip: IpAddr) -> (bool, u128) {
    match ip {
        IpAddr::V4(v4) => (true, u128::from(u32::from(v4))),
        IpAddr::V6(v6) => (false, u128::from(v6)),
    }
}

fn compile_prefix(raw: &GeoPrefix) -> Result<Prefix> {
    let (addr_s, len_s) = raw.prefix.split_once('/').ok_or_else(|| {
        TariffError::BadRequest(format!("invalid geo prefix: {} (expected addr/len)", raw.prefix))
    })?;
    let addr: IpAddr = addr_s
        .trim()
        .parse()
        .map_err(|_| TariffError::BadRequest(format!("invalid geo prefix address: {addr_s}")))?;
    let len: u8 = len_s
        .trim()
        .parse()
        .map_err(|_| TariffError::BadRequest(format!("invalid geo prefix length: {len_s}")))?;

    let (v4, net) = addr_bits(addr);
    let width = if v4 { 32 } else { 128 };
    if u32::from(len) > width {
        return Err(TariffError::BadRequest(format!(
            "geo prefix length {len} exceeds address width in {}",
            raw.prefix
        )));
    }

    let country = CountryCode::parse(&raw.country)
        .map_err(|e| TariffError::BadRequest(format!("geo prefix {}: {e}", raw.prefix)))?;

    Ok(Prefix { net, len, v4, country })
}

/// Longest-prefix-match classifier built from config.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoTable {
    // Sorted by descending prefix length so the first hit is the longest.
    prefixes: Vec<Prefix>,
}

impl StaticGeoTable {
    pub fn compile(raw: &[GeoPrefix]) -> Result<Self> {
        let mut prefixes = raw.iter().map(compile_prefix).collect::<Result<Vec<_>>>()?;
        prefixes.sort_by(|a, b| b.len.cmp(&a.len));
        Ok(Self { prefixes })
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn lookup(&self, ip: IpAddr) -> Option<CountryCode> {
        let (v4, addr) = addr_bits(ip);
        self.prefixes
            .iter()
            .find(|p| p.matches(v4, addr))
            .map(|p| p.country)
    }
}

impl GeoClassifier for StaticGeoTable {
    fn resolve(&self, ip: IpAddr) -> Result<Option<CountryCode>> {
        self.lookup(ip).map(Some).ok_or(TariffError::AddressNotFound(ip))
    }
}
