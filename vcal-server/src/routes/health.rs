use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use vcal_core::EventStore;

use super::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub events: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Result<Json<Health>, AppError> {
    let events = state.store.list_events().await?;

    Ok(Json(Health {
        status: "ok",
        events: events.len(),
    }))
}
