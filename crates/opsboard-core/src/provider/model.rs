//! Data provider models.
//!
//! Field names follow the upstream JSON so responses deserialize directly.
//! Optional upstream fields default instead of failing.

use serde::{Deserialize, Serialize};

/// Kelvin offset used by OpenWeather temperatures.
const KELVIN_OFFSET: f64 = 273.15;

/// Current conditions for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub main: WeatherMain,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
    #[serde(default)]
    pub wind: Option<Wind>,
}

impl CurrentWeather {
    pub fn celsius(&self) -> f64 {
        kelvin_to_celsius(self.main.temp)
    }

    pub fn description(&self) -> &str {
        self.weather
            .first()
            .and_then(|w| w.description.as_deref())
            .unwrap_or("clear sky")
    }

    pub fn icon(&self) -> &str {
        self.weather
            .first()
            .and_then(|w| w.icon.as_deref())
            .unwrap_or("01d")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherMain {
    pub temp: f64,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherCondition {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

/// Daily forecast entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Unix seconds.
    pub dt: i64,
    pub main: WeatherMain,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

impl ForecastEntry {
    pub fn celsius(&self) -> f64 {
        kelvin_to_celsius(self.main.temp)
    }
}

/// A coin from the markets listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub price_change_percentage_24h: f64,
}

/// One point of a coin's price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix milliseconds.
    pub date: i64,
    pub price: f64,
}

/// History window for price charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1d")]
    OneDay,
    #[default]
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl TimeRange {
    /// Parse a range label. Unknown labels map to seven days.
    pub fn parse(label: &str) -> Self {
        match label {
            "1d" => Self::OneDay,
            "30d" => Self::ThirtyDays,
            _ => Self::SevenDays,
        }
    }

    pub fn days(self) -> u32 {
        match self {
            Self::OneDay => 1,
            Self::SevenDays => 7,
            Self::ThirtyDays => 30,
        }
    }

    /// Sampling interval requested from the upstream API.
    pub fn interval(self) -> &'static str {
        if self.days() > 1 {
            "daily"
        } else {
            "hourly"
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::SevenDays => "7d",
            Self::ThirtyDays => "30d",
        }
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_parse_defaults_to_week() {
        assert_eq!(TimeRange::parse("1d"), TimeRange::OneDay);
        assert_eq!(TimeRange::parse("30d"), TimeRange::ThirtyDays);
        assert_eq!(TimeRange::parse("1y"), TimeRange::SevenDays);
        assert_eq!(TimeRange::OneDay.interval(), "hourly");
        assert_eq!(TimeRange::ThirtyDays.interval(), "daily");
    }

    #[test]
    fn test_coin_without_symbol_still_decodes() {
        let coin: CoinMarket =
            serde_json::from_str(r#"{"id":"bitcoin","name":"Bitcoin","current_price":63000}"#).unwrap();
        assert_eq!(coin.symbol, "");
        assert_eq!(coin.price_change_percentage_24h, 0.0);
    }

    #[test]
    fn test_weather_defaults_for_missing_condition() {
        let weather: CurrentWeather =
            serde_json::from_str(r#"{"name":"London","main":{"temp":283.15}}"#).unwrap();
        assert_eq!(weather.description(), "clear sky");
        assert_eq!(weather.icon(), "01d");
        assert!((weather.celsius() - 10.0).abs() < 1e-9);
    }
}
