//! External data providers (weather, crypto).
//!
//! Callers never see a blank result: a failed fetch is replaced by a
//! deterministic placeholder and the failure is carried alongside it as an
//! inline message.

pub mod chart;
pub mod crypto;
pub mod model;
pub mod weather;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::error::CoreResult;
use model::{CoinMarket, CurrentWeather, Forecast, PricePoint, TimeRange};

/// Request timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn get_weather(&self, city: &str) -> CoreResult<CurrentWeather>;
    async fn get_forecast(&self, city: &str) -> CoreResult<Forecast>;
}

#[async_trait]
pub trait CryptoProvider: Send + Sync {
    async fn get_markets(&self) -> CoreResult<Vec<CoinMarket>>;
    async fn get_history(&self, coin_id: &str, range: TimeRange) -> CoreResult<Vec<PricePoint>>;
}

/// Provider settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub openweather_url: String,
    pub openweather_api_key: String,
    pub coingecko_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openweather_url: weather::DEFAULT_OPENWEATHER_URL.to_string(),
            openweather_api_key: String::new(),
            coingecko_url: crypto::DEFAULT_COINGECKO_URL.to_string(),
        }
    }
}

/// Weather and crypto providers used by the dashboard.
#[derive(Clone)]
pub struct Providers {
    pub weather: Arc<dyn WeatherProvider>,
    pub crypto: Arc<dyn CryptoProvider>,
}

impl Providers {
    pub fn new(weather: Arc<dyn WeatherProvider>, crypto: Arc<dyn CryptoProvider>) -> Self {
        Self { weather, crypto }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            weather: Arc::new(weather::OpenWeatherClient::new(
                &config.openweather_url,
                &config.openweather_api_key,
            )),
            crypto: Arc::new(crypto::CoinGeckoClient::new(&config.coingecko_url)),
        }
    }
}

/// Data plus the inline error shown when it is a placeholder.
#[derive(Debug, Clone, Serialize)]
pub struct Fetched<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Fetched<T> {
    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            error: self.error,
        }
    }
}

/// Await a provider call, substituting `placeholder` on failure.
pub async fn fetch_or_placeholder<T, F>(
    what: &str,
    fetch: F,
    placeholder: impl FnOnce() -> T,
) -> Fetched<T>
where
    F: Future<Output = CoreResult<T>>,
{
    match fetch.await {
        Ok(data) => Fetched { data, error: None },
        Err(e) => {
            warn!(error = %e, what = %what, "Data fetch failed, using placeholder data");
            Fetched {
                data: placeholder(),
                error: Some(format!("Failed to fetch {}. Please try again.", what)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[tokio::test]
    async fn test_success_has_no_error() {
        let fetched = fetch_or_placeholder("numbers", async { Ok(vec![1, 2]) }, Vec::new).await;
        assert_eq!(fetched.data, vec![1, 2]);
        assert!(!fetched.is_placeholder());
    }

    #[tokio::test]
    async fn test_failure_substitutes_placeholder() {
        let fetched = fetch_or_placeholder(
            "weather data",
            async { Err::<CurrentWeather, _>(CoreError::data_fetch("openweather", "down")) },
            || weather::placeholder_weather("London"),
        )
        .await;
        assert!(fetched.is_placeholder());
        assert_eq!(fetched.data.name, "London");
        assert_eq!(
            fetched.error.as_deref(),
            Some("Failed to fetch weather data. Please try again.")
        );
    }
}
