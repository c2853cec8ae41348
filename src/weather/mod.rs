use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::weather_routes()
}
