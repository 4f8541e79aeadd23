//! Plain series data handed to the chart renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Forecast, PricePoint};

/// Labels plus one or more named series of numbers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

impl ChartData {
    /// Temperature series for the first five forecast days, labelled by weekday.
    pub fn from_forecast(forecast: &Forecast) -> Self {
        let days = forecast.list.iter().take(5);
        let mut labels = Vec::new();
        let mut data = Vec::new();
        for entry in days {
            labels.push(format_utc(entry.dt * 1000, "%a"));
            data.push((entry.celsius() * 10.0).round() / 10.0);
        }
        Self {
            labels,
            datasets: vec![Dataset {
                label: "Temperature (°C)".to_string(),
                data,
            }],
        }
    }

    /// Price series labelled by month and day.
    pub fn from_history(coin_name: &str, history: &[PricePoint]) -> Self {
        Self {
            labels: history
                .iter()
                .map(|p| format_utc(p.date, "%b %-d"))
                .collect(),
            datasets: vec![Dataset {
                label: format!("{} Price (USD)", coin_name).trim_start().to_string(),
                data: history.iter().map(|p| p.price).collect(),
            }],
        }
    }
}

fn format_utc(millis: i64, fmt: &str) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|d| d.format(fmt).to_string())
        .unwrap_or_default()
}
