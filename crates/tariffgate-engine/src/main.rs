//! tariffgate engine (standalone)
//!
//! Serves the control API over the engine state. Hosts that intercept traffic
//! embed the library instead and feed `AppState::on_response`; this binary
//! uses the static prefix table from the config and a logging host.
//!
//! Usage: `tariffgate-engine [config.yaml]` (default `tariffgate.yaml`)

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use tariffgate_engine::{app_state, config, router, StaticGeoTable, TracingHost};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "tariffgate.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.control.listen_addr()?;

    let geo = Arc::new(StaticGeoTable::compile(&cfg.geo.prefixes)?);
    tracing::info!(prefixes = geo.len(), "static geo table loaded");

    let state = app_state::AppState::new(cfg, geo, Arc::new(TracingHost))?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "tariffgate-engine starting");
    let listener = tokio::net::TcpListener::bind(listen).await.map_err(|e| {
        tracing::error!(%listen, error = %e, "bind failed");
        e
    })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let forfeited = state.retention().clear();
    if let Err(e) = state.save_rules() {
        tracing::warn!(error = %e, "saving rules on shutdown failed");
    }
    tracing::info!(forfeited, "tariffgate-engine stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl-c handler failed");
    }
}
