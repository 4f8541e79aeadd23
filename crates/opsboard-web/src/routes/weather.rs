//! Weather route handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use opsboard_core::provider::chart::ChartData;
use opsboard_core::provider::model::{CurrentWeather, Forecast};
use opsboard_core::provider::{fetch_or_placeholder, weather, Fetched};

use super::Charted;
use crate::state::AppState;

/// GET /api/weather/{city} - Current conditions.
pub async fn current(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Json<Fetched<CurrentWeather>> {
    let fetched = fetch_or_placeholder(
        "weather data",
        state.providers.weather.get_weather(&city),
        || weather::placeholder_weather(&city),
    )
    .await;
    Json(fetched)
}

/// GET /api/weather/{city}/forecast - Five-day forecast and temperature chart.
pub async fn forecast(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Json<Charted<Forecast>> {
    let fetched = fetch_or_placeholder(
        "forecast data",
        state.providers.weather.get_forecast(&city),
        weather::placeholder_forecast,
    )
    .await;
    let chart = ChartData::from_forecast(&fetched.data);
    Json(Charted { fetched, chart })
}
