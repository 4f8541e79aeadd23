//! Listen command.
//!
//! Opens a channel to the hub and prints the feed whenever it changes.
//! Typing `r` marks everything as read.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use opsboard_channel::synth::DEFAULT_SYNTH_PERIOD;
use opsboard_channel::{attach_feed, ws_endpoint, ChannelClient, Synthesizer, Transport};
use opsboard_core::events;
use opsboard_core::notification::{MessageCatalog, NotificationFeed};
use opsboard_core::notifier::DEFAULT_SERVER_URL;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output;

#[derive(Args)]
pub struct ListenArgs {
    /// Server base URL
    #[arg(long, env = "OPSBOARD_URL", default_value = DEFAULT_SERVER_URL)]
    pub url: String,

    /// Emit a random notification every N seconds
    #[arg(long, value_name = "SECS", num_args = 0..=1, default_missing_value = "15")]
    pub emit_every: Option<u64>,
}

pub async fn execute(args: ListenArgs) -> Result<()> {
    let endpoint = ws_endpoint(&args.url);
    let client = ChannelClient::new();
    let channel = client.connect(&endpoint);

    channel.on(
        events::CONNECT_ERROR,
        Arc::new(|payload: &Value| {
            let attempts = payload["attempts"].as_u64().unwrap_or_default();
            eprintln!(
                "{} hub unreachable after {} attempts, continuing offline",
                "!".yellow(),
                attempts
            );
        }),
    );

    let feed = NotificationFeed::new();
    attach_feed(&channel, &feed);

    let _synth = args.emit_every.map(|secs| {
        let period = if secs == 0 {
            DEFAULT_SYNTH_PERIOD
        } else {
            Duration::from_secs(secs)
        };
        Synthesizer::spawn(channel.clone(), MessageCatalog::client(), period)
    });

    println!("{} {}", "Listening on".cyan(), endpoint);
    println!("{}", "Type r + Enter to mark all as read, Ctrl+C to quit".dimmed());

    let mut snapshots = feed.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                output::print_feed(&snapshot);
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().eq_ignore_ascii_case("r") => feed.mark_all_read(),
                    Some(_) => {}
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.disconnect();
    Ok(())
}
