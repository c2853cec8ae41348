use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;

use super::client::ForecastQuery;
use crate::{error::ApiError, state::AppState};

pub fn weather_routes() -> Router<AppState> {
    Router::new().route("/weather", get(get_weather))
}

#[instrument(skip(state))]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(q): Query<ForecastQuery>,
) -> Result<Json<Value>, ApiError> {
    state
        .weather
        .daily_forecast(&q)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("weather upstream", e))
}
