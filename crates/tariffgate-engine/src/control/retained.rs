use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use tariffgate_core::RetainedFlow;

use crate::app_state::AppState;

/// `GET /v1/retained`
pub async fn list_retained(State(app): State<AppState>) -> Json<Vec<RetainedFlow>> {
    Json(app.retention().list_retained())
}

/// `DELETE /v1/retained`
pub async fn clear_retained(State(app): State<AppState>) -> Json<Value> {
    let cleared = app.retention().clear();
    Json(json!({ "cleared": cleared }))
}
