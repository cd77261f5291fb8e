//! Engine config loader (strict parsing).

pub mod schema;

use std::fs;

use tariffgate_core::error::{Result, TariffError};

pub use schema::{ControlSection, EngineConfig, GeoSection, PolicySection};

pub fn load_from_file(path: &str) -> Result<EngineConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TariffError::Internal(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<EngineConfig> {
    let cfg: EngineConfig = serde_yaml::from_str(s)
        .map_err(|e| TariffError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
