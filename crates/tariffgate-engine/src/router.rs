//! Axum router wiring for the control API.

use axum::{routing::get, Router};

use crate::{app_state::AppState, control, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .route("/v1/rules", get(control::rules::list_rules))
        .route(
            "/v1/rules/:cc",
            get(control::rules::get_rule)
                .put(control::rules::put_rule)
                .delete(control::rules::delete_rule),
        )
        .route(
            "/v1/retained",
            get(control::retained::list_retained).delete(control::retained::clear_retained),
        )
        .with_state(state)
}
