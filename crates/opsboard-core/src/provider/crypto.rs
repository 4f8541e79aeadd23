//! CoinGecko client.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use super::model::{CoinMarket, PricePoint, TimeRange};
use super::{CryptoProvider, DEFAULT_TIMEOUT};
use crate::error::{CoreError, CoreResult};

/// Default CoinGecko API base URL.
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Coins listed per markets request.
const MARKETS_PER_PAGE: &str = "10";

#[derive(Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

/// CoinGecko HTTP client.
#[derive(Clone)]
pub struct CoinGeckoClient {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn default_client() -> Self {
        Self::new(DEFAULT_COINGECKO_URL)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> CoreResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Fetching crypto data");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| CoreError::data_fetch("coingecko", e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::data_fetch(
                "coingecko",
                format!("status {}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| CoreError::data_fetch("coingecko", e.to_string()))
    }
}

#[async_trait]
impl CryptoProvider for CoinGeckoClient {
    async fn get_markets(&self) -> CoreResult<Vec<CoinMarket>> {
        self.get(
            "coins/markets",
            &[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", MARKETS_PER_PAGE),
                ("page", "1"),
                ("sparkline", "false"),
                ("price_change_percentage", "24h"),
            ],
        )
        .await
    }

    async fn get_history(&self, coin_id: &str, range: TimeRange) -> CoreResult<Vec<PricePoint>> {
        let days = range.days().to_string();
        let chart: MarketChartResponse = self
            .get(
                &format!("coins/{}/market_chart", coin_id),
                &[
                    ("vs_currency", "usd"),
                    ("days", days.as_str()),
                    ("interval", range.interval()),
                ],
            )
            .await?;

        Ok(chart
            .prices
            .into_iter()
            .map(|(date, price)| PricePoint {
                date: date as i64,
                price,
            })
            .collect())
    }
}

/// Deterministic stand-in markets.
pub fn placeholder_markets() -> Vec<CoinMarket> {
    [
        ("bitcoin", "Bitcoin", "btc", 63000.0, 2.5),
        ("ethereum", "Ethereum", "eth", 3400.0, -1.2),
        ("solana", "Solana", "sol", 120.0, 5.7),
        ("cardano", "Cardano", "ada", 0.45, 0.8),
        ("binancecoin", "Binance Coin", "bnb", 570.0, 3.2),
    ]
    .into_iter()
    .map(|(id, name, symbol, price, change)| CoinMarket {
        id: id.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
        current_price: price,
        price_change_percentage_24h: change,
    })
    .collect()
}

/// One point per day ending today, rising linearly from 50 000 USD.
pub fn placeholder_history(range: TimeRange) -> Vec<PricePoint> {
    let days = range.days() as i64;
    let today = Utc::now();
    (0..days)
        .map(|i| PricePoint {
            date: (today - Duration::days(days - i - 1)).timestamp_millis(),
            price: 50_000.0 + 5_000.0 * (i as f64 / days as f64),
        })
        .collect()
}
