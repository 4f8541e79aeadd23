//! OpenWeather client.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::model::{CurrentWeather, Forecast, ForecastEntry, WeatherCondition, WeatherMain, Wind};
use super::{WeatherProvider, DEFAULT_TIMEOUT};
use crate::error::{CoreError, CoreResult};

/// Default OpenWeather API base URL.
pub const DEFAULT_OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Forecast entries come in 3-hour slots; one per day is every 8th.
const SLOTS_PER_DAY: usize = 8;

/// Number of forecast days kept.
const FORECAST_DAYS: usize = 5;

/// OpenWeather HTTP client.
#[derive(Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    pub fn with_api_key(api_key: &str) -> Self {
        Self::new(DEFAULT_OPENWEATHER_URL, api_key)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, city: &str) -> CoreResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, city = %city, "Fetching weather data");

        let response = self
            .client
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| CoreError::data_fetch("openweather", e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::data_fetch(
                "openweather",
                format!("status {}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| CoreError::data_fetch("openweather", e.to_string()))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn get_weather(&self, city: &str) -> CoreResult<CurrentWeather> {
        self.get("weather", city).await
    }

    async fn get_forecast(&self, city: &str) -> CoreResult<Forecast> {
        let forecast: Forecast = self.get("forecast", city).await?;
        Ok(daily(forecast))
    }
}

/// Keep one entry per day, at most five days.
pub fn daily(forecast: Forecast) -> Forecast {
    Forecast {
        list: forecast
            .list
            .into_iter()
            .step_by(SLOTS_PER_DAY)
            .take(FORECAST_DAYS)
            .collect(),
    }
}

/// Deterministic stand-in used when the provider is unreachable.
pub fn placeholder_weather(city: &str) -> CurrentWeather {
    CurrentWeather {
        name: city.to_string(),
        main: WeatherMain {
            temp: 283.15,
            humidity: Some(70.0),
            pressure: Some(1013.0),
        },
        weather: vec![WeatherCondition {
            description: Some("cloudy".to_string()),
            icon: Some("04d".to_string()),
        }],
        wind: Some(Wind { speed: 5.1 }),
    }
}

/// Five days starting today, cooling by one degree per day.
pub fn placeholder_forecast() -> Forecast {
    let today = Utc::now().timestamp();
    Forecast {
        list: (0..FORECAST_DAYS as i64)
            .map(|i| ForecastEntry {
                dt: today + i * 86_400,
                main: WeatherMain {
                    temp: 283.15 - i as f64,
                    ..Default::default()
                },
                weather: vec![WeatherCondition {
                    description: None,
                    icon: Some("04d".to_string()),
                }],
            })
            .collect(),
    }
}
