//! Beacon Watch — terminal watcher for the incident notification feed.
//!
//! Wires the push client and the aggregation feed together, keeps the feed
//! fresh with periodic REST refreshes, and prints the merged view whenever
//! something changes.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use beacon_core::config::AppConfig;
use beacon_core::error::AppError;
use beacon_feed::{FileReadStateStore, HttpNotificationApi, LogNotifier, NotificationFeed};
use beacon_realtime::PushClient;

#[derive(Parser)]
#[command(name = "beacon-watch", about = "Watch the incident notification feed")]
struct Args {
    /// Session token for the platform backend.
    #[arg(long, env = "BEACON_TOKEN")]
    token: String,
    /// Configuration environment overlay (config/<env>.toml).
    #[arg(long, default_value = "development")]
    env: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match AppConfig::load(&args.env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, args.token).await {
        tracing::error!("Watcher error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig, token: String) -> Result<(), AppError> {
    tracing::info!("Starting Beacon Watch v{}", env!("CARGO_PKG_VERSION"));

    let api = Arc::new(HttpNotificationApi::new(&config.api, token.clone())?);
    let store = Arc::new(FileReadStateStore::new(&config.feed.read_state_path));
    let feed = Arc::new(NotificationFeed::new(
        config.feed.clone(),
        api,
        store,
        Arc::new(LogNotifier),
    ));
    let client = Arc::new(PushClient::new(config.api.clone(), config.realtime.clone()));

    feed.attach(&client);
    client.connect(&token).await?;

    if let Err(e) = feed.refresh().await {
        tracing::warn!("Initial refresh failed; feed may be stale: {e}");
    }
    print_snapshot(&feed, &client);

    let mut state_rx = client.state_watch();
    let mut refresh_timer = tokio::time::interval(config.feed.refresh_interval());
    refresh_timer.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                client.disconnect();
                break;
            }
            _ = refresh_timer.tick() => {
                if let Err(e) = feed.refresh().await {
                    tracing::warn!("Refresh failed; feed may be stale: {e}");
                }
                print_snapshot(&feed, &client);
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow_and_update();
                tracing::info!(%state, frames = client.frames_received(), "Connection state changed");
                print_snapshot(&feed, &client);
            }
        }
    }

    Ok(())
}

fn print_snapshot(feed: &NotificationFeed, client: &PushClient) {
    println!("── feed ({}) ──", client.state());
    for item in feed.merged() {
        let marker = if feed.is_read(&item.id) { ' ' } else { '*' };
        println!(
            "{marker} [{}] {}: {} ({})",
            item.priority.as_str(),
            item.title,
            item.message,
            item.occurred_at.format("%H:%M:%S")
        );
    }
    println!(
        "unread: {}  priority: {}  toasts: {}",
        feed.unread_count(),
        feed.priority_count(),
        feed.toasts().len()
    );
}
