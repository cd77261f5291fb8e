//! Shared application state: the engine components wired together.
//!
//! `AppState` is what a host holds. It runs the per-response hot path
//! (`on_response`) and backs the control API.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use tariffgate_core::error::Result;
use tariffgate_core::{Decision, FlowId, FlowMeta, TariffRule};

use crate::config::EngineConfig;
use crate::decision::DecisionEngine;
use crate::geo::GeoClassifier;
use crate::host::FlowHost;
use crate::obs::EngineMetrics;
use crate::policy::{persist, PolicyStore};
use crate::retention::RetentionScheduler;

/// One intercepted response, as reported by the host.
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub flow_id: FlowId,
    pub request_url: String,
    pub response_size: u64,
    pub source_ip: IpAddr,
    pub client_ip: IpAddr,
    pub request_start: DateTime<Utc>,
    pub response_end: DateTime<Utc>,
}

impl ResponseEvent {
    /// Response end minus request start, never negative.
    pub fn round_trip_time(&self) -> Duration {
        (self.response_end - self.request_start)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: EngineConfig,
    policy: Arc<PolicyStore>,
    engine: DecisionEngine,
    retention: RetentionScheduler,
    metrics: Arc<EngineMetrics>,
    // Held across snapshot and write so the last save to finish is the newest.
    save_lock: Mutex<()>,
}

impl AppState {
    /// Build application state. The rule table comes from `policy.rules_file`
    /// when that file exists, otherwise from the seed rules in the config.
    pub fn new(cfg: EngineConfig, geo: Arc<dyn GeoClassifier>, host: Arc<dyn FlowHost>) -> Result<Self> {
        let mut rules = match &cfg.policy.rules_file {
            Some(path) => persist::load_rules(path)?,
            None => Vec::new(),
        };
        if rules.is_empty() {
            rules = cfg.policy.rules.clone();
        }

        let policy = Arc::new(PolicyStore::with_rules(rules)?);
        let metrics = Arc::new(EngineMetrics::default());
        let engine = DecisionEngine::new(Arc::clone(&policy), geo, Arc::clone(&metrics));
        let retention = RetentionScheduler::new(host, Arc::clone(&metrics));

        tracing::info!(rules = policy.len(), "engine state ready");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                policy,
                engine,
                retention,
                metrics,
                save_lock: Mutex::new(()),
            }),
        })
    }

    pub fn cfg(&self) -> &EngineConfig {
        &self.inner.cfg
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.inner.policy
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.inner.engine
    }

    pub fn retention(&self) -> &RetentionScheduler {
        &self.inner.retention
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.inner.metrics
    }

    /// Hot path for one response: decide, then hand Drop/Hold to the scheduler.
    pub async fn on_response(&self, ev: ResponseEvent) -> Result<Decision> {
        let rtt = ev.round_trip_time();
        let assessment = self.inner.engine.assess(&ev.flow_id, ev.source_ip, rtt);
        if assessment.decision.is_pass() {
            return Ok(Decision::Pass);
        }

        let meta = FlowMeta {
            flow_id: ev.flow_id,
            request_url: ev.request_url,
            response_size: ev.response_size,
            source_ip: ev.source_ip,
            source_country: assessment.source_country,
            client_ip: ev.client_ip,
            received_at: ev.response_end,
            round_trip_time: rtt,
        };
        self.inner.retention.register(meta, assessment.decision).await?;
        Ok(assessment.decision)
    }

    /// Control-plane `SetRule`, followed by autosave when configured.
    pub fn set_rule(&self, country_code: &str, rate: f64, dropped: bool) -> Result<TariffRule> {
        let rule = self.inner.policy.set_rule(country_code, rate, dropped)?;
        self.autosave();
        Ok(rule)
    }

    /// Control-plane `RemoveRule`, followed by autosave when something changed.
    pub fn remove_rule(&self, country_code: &str) -> bool {
        let removed = self.inner.policy.remove_rule(country_code);
        if removed {
            self.autosave();
        }
        removed
    }

    fn rules_file(&self) -> Option<&PathBuf> {
        self.inner.cfg.policy.rules_file.as_ref()
    }

    /// Write the table to `policy.rules_file`. No-op when no file is configured.
    pub fn save_rules(&self) -> Result<()> {
        let Some(path) = self.rules_file() else {
            return Ok(());
        };
        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.inner.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        persist::save_rules(path, &self.inner.policy.sorted_rules())
    }

    fn autosave(&self) {
        if !self.inner.cfg.policy.autosave {
            return;
        }
        // The mutation already happened; a failed save is logged, not rolled back.
        if let Err(e) = self.save_rules() {
            tracing::warn!(error = %e, "rules autosave failed");
        }
    }
}
