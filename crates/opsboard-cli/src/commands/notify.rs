//! Notify command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use opsboard_core::notifier::{HubNotifier, DEFAULT_SERVER_URL};

#[derive(Args)]
pub struct NotifyArgs {
    /// Notification text
    pub message: String,

    /// Server base URL
    #[arg(long, env = "OPSBOARD_URL", default_value = DEFAULT_SERVER_URL)]
    pub url: String,
}

pub async fn execute(args: NotifyArgs) -> Result<()> {
    let notifier = HubNotifier::with_url(&args.url);
    let notification = notifier.notify_message(&args.message).await?;
    println!(
        "{} {} {}",
        "✓".green(),
        notification.message,
        format!("(#{})", notification.id).dimmed()
    );
    Ok(())
}
