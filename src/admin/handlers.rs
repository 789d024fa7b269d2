use axum::{extract::State, Json};

use crate::http::server::AppState;
use crate::resilience::BreakerSnapshot;
use crate::routing::RouteSummary;

pub async fn get_breakers(State(state): State<AppState>) -> Json<Vec<BreakerSnapshot>> {
    Json(state.breakers.snapshots())
}

pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteSummary>> {
    Json(state.routes.routes().iter().map(|r| r.summary()).collect())
}
