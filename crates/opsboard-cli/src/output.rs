//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use opsboard_core::notification::FeedSnapshot;
use opsboard_core::provider::chart::ChartData;
use opsboard_core::provider::model::{CoinMarket, CurrentWeather};
use opsboard_core::provider::Fetched;

/// Print the inline error attached to placeholder data.
fn print_inline_error<T>(fetched: &Fetched<T>) {
    if let Some(error) = &fetched.error {
        println!("{}", error.red());
    }
}

/// Print the notification feed.
pub fn print_feed(feed: &FeedSnapshot) {
    println!();
    if feed.history.is_empty() {
        println!("{}", "No new notifications".dimmed());
        return;
    }

    if feed.unread > 0 {
        let noun = if feed.unread == 1 { "notification" } else { "notifications" };
        println!("{}", format!("{} new {}", feed.unread, noun).cyan().bold());
    }
    for n in &feed.history {
        println!("  {} {}", n.display_time().dimmed(), n.message);
    }
}

/// Print current weather.
pub fn print_weather(weather: &Fetched<CurrentWeather>) {
    print_inline_error(weather);
    let w = &weather.data;
    println!("{}", w.name.cyan().bold());
    println!("{}: {:.1}°C", "Temperature".bold(), w.celsius());
    println!("{}: {}", "Conditions".bold(), w.description());
    if let Some(humidity) = w.main.humidity {
        println!("{}: {}%", "Humidity".bold(), humidity);
    }
    if let Some(wind) = &w.wind {
        println!("{}: {} m/s", "Wind".bold(), wind.speed);
    }
}

/// Print top markets as a table.
pub fn print_markets(markets: &Fetched<Vec<CoinMarket>>) {
    print_inline_error(markets);
    if markets.data.is_empty() {
        println!("{}", "No cryptocurrency data.".dimmed());
        return;
    }

    println!("{:<20} {:<8} {:>14} {:>10}", "Name", "Symbol", "Price (USD)", "24h");
    println!("{}", "-".repeat(55));
    for coin in &markets.data {
        println!(
            "{:<20} {:<8} {:>14.2} {:>10}",
            truncate(&coin.name, 18),
            coin.symbol.to_uppercase(),
            coin.current_price,
            change(coin.price_change_percentage_24h)
        );
    }
}

/// Print a chart series as label/value rows.
pub fn print_chart(title: &str, chart: &Fetched<ChartData>) {
    print_inline_error(chart);
    println!("{}", title.bold());
    let Some(dataset) = chart.data.datasets.first() else {
        println!("{}", "No data.".dimmed());
        return;
    };
    println!("{}", dataset.label.dimmed());
    for (label, value) in chart.data.labels.iter().zip(&dataset.data) {
        println!("  {:<8} {:>12.2}", label, value);
    }
}

fn change(percent: f64) -> ColoredString {
    let text = format!("{:.2}%", percent.abs());
    if percent >= 0.0 {
        format!("↑{}", text).green()
    } else {
        format!("↓{}", text).red()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
