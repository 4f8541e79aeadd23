//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod crypto;
pub mod listen;
pub mod notify;
pub mod serve;
pub mod weather;

/// Opsboard - operations dashboard with live notifications
#[derive(Parser)]
#[command(name = "opsboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the dashboard server and notification hub
    Serve(serve::ServeArgs),

    /// Connect to a hub and print the live notification feed
    Listen(listen::ListenArgs),

    /// Send a notification to every connected client
    Notify(notify::NotifyArgs),

    /// Show current weather and forecast for a city
    Weather(weather::WeatherArgs),

    /// Show top crypto markets or a coin's price history
    Crypto(crypto::CryptoArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::execute(args).await,
            Commands::Listen(args) => listen::execute(args).await,
            Commands::Notify(args) => notify::execute(args).await,
            Commands::Weather(args) => weather::execute(args).await,
            Commands::Crypto(args) => crypto::execute(args).await,
        }
    }
}
