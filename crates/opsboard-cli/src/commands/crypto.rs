//! Crypto command.

use anyhow::Result;
use clap::Args;
use opsboard_core::provider::chart::ChartData;
use opsboard_core::provider::crypto::{placeholder_history, placeholder_markets};
use opsboard_core::provider::model::TimeRange;
use opsboard_core::provider::{fetch_or_placeholder, ProviderConfig, Providers};

use crate::output;

#[derive(Args)]
pub struct CryptoArgs {
    /// Show price history for this coin id instead of the market list
    #[arg(long)]
    pub coin: Option<String>,

    /// History window: 1d, 7d or 30d
    #[arg(long, default_value = "7d")]
    pub range: String,
}

pub async fn execute(args: CryptoArgs) -> Result<()> {
    let providers = Providers::from_config(&ProviderConfig::default());

    let markets = fetch_or_placeholder(
        "cryptocurrency data",
        providers.crypto.get_markets(),
        placeholder_markets,
    )
    .await;

    let Some(coin_id) = args.coin else {
        output::print_markets(&markets);
        return Ok(());
    };

    let range = TimeRange::parse(&args.range);
    let name = markets
        .data
        .iter()
        .find(|c| c.id == coin_id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| coin_id.clone());

    let history = fetch_or_placeholder(
        "price history",
        providers.crypto.get_history(&coin_id, range),
        || placeholder_history(range),
    )
    .await
    .map(|h| ChartData::from_history(&name, &h));

    output::print_chart(&format!("{} ({})", name, range.label()), &history);
    Ok(())
}
