//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use opsboard_core::provider::ProviderConfig;
use opsboard_web::{ServerConfig, DEFAULT_PORT};
use std::path::PathBuf;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "OPSBOARD_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (defaults to logs/opsboard.log)
    #[arg(long, requires = "log")]
    pub log_file: Option<PathBuf>,

    /// OpenWeather API key
    #[arg(long, env = "OPENWEATHER_API_KEY", default_value = "", hide_env_values = true)]
    pub openweather_key: String,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        host: args.host.clone(),
        port: args.port,
        providers: ProviderConfig {
            openweather_api_key: args.openweather_key.clone(),
            ..ProviderConfig::default()
        },
        ..ServerConfig::default()
    };

    println!();
    println!("  {} {}", "Opsboard".cyan().bold(), "Dashboard Server".bold());
    println!();
    println!("  {}  http://{}:{}", "Dashboard".green(), args.host, args.port);
    println!("  {}       http://{}:{}/api", "API".green(), args.host, args.port);
    println!("  {}  ws://{}:{}/ws", "WebSocket".green(), args.host, args.port);
    if args.openweather_key.is_empty() {
        println!(
            "  {}",
            "No OpenWeather key set, weather will use placeholder data".yellow()
        );
    }
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    opsboard_web::run_server(config).await
}
