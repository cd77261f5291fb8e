use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use tariffgate_core::error::{Result, TariffError};
use tariffgate_core::TariffRule;

use crate::geo::{GeoPrefix, StaticGeoTable};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub version: u32,

    #[serde(default)]
    pub control: ControlSection,

    #[serde(default)]
    pub policy: PolicySection,

    #[serde(default)]
    pub geo: GeoSection,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TariffError::UnsupportedVersion);
        }

        self.control.validate()?;
        self.policy.validate()?;
        self.geo.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ControlSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|_| TariffError::BadRequest(format!("control.listen must be a socket address: {}", self.listen)))
    }
}

fn default_listen() -> String {
    "127.0.0.1:8081".into()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySection {
    /// Persisted rule table; loaded at boot when present.
    #[serde(default)]
    pub rules_file: Option<PathBuf>,

    /// Save the table back to `rules_file` after every mutation.
    #[serde(default)]
    pub autosave: bool,

    /// Seed rules, used when `rules_file` is unset or does not exist yet.
    #[serde(default)]
    pub rules: Vec<TariffRule>,
}

impl PolicySection {
    pub fn validate(&self) -> Result<()> {
        if self.autosave && self.rules_file.is_none() {
            return Err(TariffError::BadRequest("policy.autosave requires policy.rules_file".into()));
        }
        for rule in &self.rules {
            rule.validate()
                .map_err(|e| TariffError::BadRequest(format!("policy.rules: {e}")))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoSection {
    #[serde(default)]
    pub prefixes: Vec<GeoPrefix>,
}

impl GeoSection {
    pub fn validate(&self) -> Result<()> {
        StaticGeoTable::compile(&self.prefixes).map(|_| ())
    }
}
