//! Weather command.

use anyhow::Result;
use clap::Args;
use opsboard_core::provider::chart::ChartData;
use opsboard_core::provider::weather::{placeholder_forecast, placeholder_weather};
use opsboard_core::provider::{fetch_or_placeholder, ProviderConfig, Providers};

use crate::output;

#[derive(Args)]
pub struct WeatherArgs {
    /// City name
    #[arg(default_value = "London")]
    pub city: String,

    /// OpenWeather API key
    #[arg(long, env = "OPENWEATHER_API_KEY", default_value = "", hide_env_values = true)]
    pub openweather_key: String,
}

pub async fn execute(args: WeatherArgs) -> Result<()> {
    let providers = Providers::from_config(&ProviderConfig {
        openweather_api_key: args.openweather_key,
        ..ProviderConfig::default()
    });

    let current = fetch_or_placeholder(
        "weather data",
        providers.weather.get_weather(&args.city),
        || placeholder_weather(&args.city),
    )
    .await;
    output::print_weather(&current);

    let forecast = fetch_or_placeholder(
        "forecast data",
        providers.weather.get_forecast(&args.city),
        placeholder_forecast,
    )
    .await
    .map(|f| ChartData::from_forecast(&f));
    println!();
    output::print_chart("5-Day Forecast (°C)", &forecast);

    Ok(())
}
