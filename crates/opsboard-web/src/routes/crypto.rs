//! Cryptocurrency route handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use opsboard_core::provider::chart::ChartData;
use opsboard_core::provider::model::{CoinMarket, PricePoint, TimeRange};
use opsboard_core::provider::{crypto, fetch_or_placeholder, Fetched};
use serde::Deserialize;

use super::Charted;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub range: Option<String>,
}

/// GET /api/crypto - Top coins by market cap.
pub async fn markets(State(state): State<AppState>) -> Json<Fetched<Vec<CoinMarket>>> {
    let fetched = fetch_or_placeholder(
        "cryptocurrency data",
        state.providers.crypto.get_markets(),
        crypto::placeholder_markets,
    )
    .await;
    Json(fetched)
}

/// GET /api/crypto/{id}/history?range=7d - Price history and chart.
pub async fn history(
    State(state): State<AppState>,
    Path(coin_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Json<Charted<Vec<PricePoint>>> {
    let range = query
        .range
        .as_deref()
        .map(TimeRange::parse)
        .unwrap_or_default();
    let fetched = fetch_or_placeholder(
        "price history",
        state.providers.crypto.get_history(&coin_id, range),
        || crypto::placeholder_history(range),
    )
    .await;
    let chart = ChartData::from_history(&display_name(&coin_id), &fetched.data);
    Json(Charted { fetched, chart })
}

/// `bitcoin` -> `Bitcoin`.
fn display_name(coin_id: &str) -> String {
    let mut chars = coin_id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
