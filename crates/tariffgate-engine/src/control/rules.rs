use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use tariffgate_core::TariffRule;

use super::ApiResult;
use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleBody {
    /// Required unless `dropped` is true.
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub dropped: bool,
}

/// `GET /v1/rules`
pub async fn list_rules(State(app): State<AppState>) -> Json<Vec<TariffRule>> {
    Json(app.policy().sorted_rules())
}

/// `GET /v1/rules/:cc`
pub async fn get_rule(State(app): State<AppState>, Path(cc): Path<String>) -> Response {
    match app.policy().get_rule(&cc) {
        Some(rule) => Json(rule).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `PUT /v1/rules/:cc`
pub async fn put_rule(
    State(app): State<AppState>,
    Path(cc): Path<String>,
    Json(body): Json<RuleBody>,
) -> ApiResult<Json<TariffRule>> {
    let rule = TariffRule::from_parts(&cc, body.rate, body.dropped)?;
    let rule = app.set_rule(rule.country_code.as_str(), rule.rate, rule.dropped)?;
    Ok(Json(rule))
}

/// `DELETE /v1/rules/:cc` (absent codes are fine)
pub async fn delete_rule(State(app): State<AppState>, Path(cc): Path<String>) -> StatusCode {
    app.remove_rule(&cc);
    StatusCode::NO_CONTENT
}
