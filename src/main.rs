use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};

use giveaway_sync::config::Config;
use giveaway_sync::domain::{BulkEventSettings, EventConfig};
use giveaway_sync::logging::init_tracing;
use giveaway_sync::screens::{
    start_background_refresh, DashboardModel, EventsModel, LinkFlow, LinkOpener, LisSkinsModel,
    PurchaseTracker, StreamerPageModel,
};
use giveaway_sync::session::{
    CredentialStore, EnvIdentity, FileCredentialStore, IdentityProvider, SessionManager,
};
use giveaway_sync::transport::Transport;
use giveaway_sync::ServiceClient;

#[derive(Parser)]
#[command(name = "giveaway-sync")]
#[command(about = "Command-line client for the giveaway service")]
struct Cli {
    /// Path to config file (default: <config dir>/giveaway-sync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Acquire a session from the host identity, or a dev login
    Login {
        /// Telegram user id for the development login endpoint
        #[arg(long)]
        dev: Option<i64>,
    },
    /// Forget the stored session
    Logout,
    /// Show profile, tracked streamers and streamer settings
    Status,
    /// Link a Twitch account and wait for the link to be confirmed
    LinkTwitch {
        /// Seconds to wait for confirmation
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// List streamer events
    Events,
    /// Enable or disable a streamer event
    ToggleEvent {
        event_key: String,
        state: Switch,
    },
    /// Save the prize settings of one event
    EventConfig {
        event_key: String,
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
        #[arg(long)]
        winners: Option<u32>,
        #[arg(long)]
        trigger: Option<f64>,
    },
    /// Apply prize settings to every event
    ApplyAll {
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
        #[arg(long)]
        winners: Option<u32>,
    },
    /// Set the price range prizes are bought in
    PriceRange { min: f64, max: f64 },
    /// Show a streamer's page
    Streamer {
        id: i64,
        /// Also list one page of the streamer's prizes (zero-based)
        #[arg(long)]
        prizes_page: Option<u32>,
    },
    /// List streamers that are live now
    Live,
    /// Show follower dynamics of your channel
    Followers,
    /// Track a streamer by Twitch login
    Track { login: String },
    /// Stop tracking a streamer
    Untrack { id: i64 },
    /// Show the delivery status of a purchase
    Purchase {
        id: i64,
        /// Keep polling until the purchase settles
        #[arg(long)]
        watch: bool,
        /// Seconds to keep polling with --watch
        #[arg(long, default_value_t = 600)]
        timeout: u64,
    },
    /// Show the latest prizes
    Prizes {
        #[arg(long, default_value_t = 3)]
        limit: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

/// Prints the URL for the user to open in their browser.
struct StdoutOpener;

#[async_trait]
impl LinkOpener for StdoutOpener {
    async fn open(&self, url: &str) -> Result<(), String> {
        println!("Open this URL to link your Twitch account:\n  {}", url);
        Ok(())
    }
}

fn build_client(config: &Config) -> anyhow::Result<ServiceClient> {
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::open(config.token_path()));
    let transport =
        Transport::new(&config.api, store.clone()).context("Failed to create HTTP client")?;
    let identity: Arc<dyn IdentityProvider> =
        Arc::new(EnvIdentity::new(config.session.identity_env.clone()));
    Ok(ServiceClient::new(SessionManager::new(
        transport, store, identity,
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    tracing::debug!(base_url = %config.api.base_url, "Configuration loaded");
    let client = build_client(&config)?;

    match cli.command {
        Command::Login { dev } => {
            match dev {
                Some(telegram_id) => client.session().login_dev(telegram_id).await?,
                None => client.session().ensure().await?,
            };
            println!("Signed in.");
        }

        Command::Logout => {
            client.session().logout();
            println!("Signed out.");
        }

        Command::Status => {
            let dashboard = DashboardModel::new(client).refresh().await?;
            match &dashboard.profile {
                Some(profile) => {
                    let twitch = profile.twitch_login.as_deref().unwrap_or("-");
                    println!(
                        "Twitch: {}",
                        if profile.twitch_linked { twitch } else { "not linked" }
                    );
                    println!(
                        "Steam trade URL: {}",
                        if profile.steam_linked() { "set" } else { "not set" }
                    );
                    println!(
                        "Giveaways: {}",
                        if dashboard.can_participate() { "participating" } else { "not participating" }
                    );
                }
                None => println!("Profile: unavailable"),
            }
            if let Some(tracked) = &dashboard.tracked {
                println!("Tracked streamers: {}", tracked.streamers.len());
                for streamer in &tracked.streamers {
                    let name = streamer
                        .display_name
                        .as_deref()
                        .or(streamer.twitch_login.as_deref())
                        .unwrap_or("?");
                    println!("  [{}] {}", streamer.id, name);
                }
            }
            if dashboard.is_streamer() {
                if let Some(me) = &dashboard.streamer {
                    let enabled = me.events.iter().filter(|e| e.enabled).count();
                    println!("Streamer events enabled: {}/{}", enabled, me.events.len());
                }
            }
            if !dashboard.is_complete() {
                println!("Unavailable sections: {}", dashboard.missing.join(", "));
            }
        }

        Command::LinkTwitch { timeout } => {
            let flow = LinkFlow::new(client, Arc::new(StdoutOpener), config.polling.interval());
            if flow.sync_profile().await?.is_linked() {
                println!("Twitch account already linked.");
                return Ok(());
            }
            let state = flow.run(Duration::from_secs(timeout)).await?;
            if state.is_linked() {
                println!("Twitch account linked.");
            } else {
                println!("Linking not confirmed yet; run `giveaway-sync status` later.");
            }
        }

        Command::Events => {
            let events = EventsModel::new(client);
            for (key, enabled) in events.refresh().await? {
                println!("{:<32} {}", key, if enabled { "on" } else { "off" });
            }
        }

        Command::ToggleEvent { event_key, state } => {
            let events = EventsModel::new(client);
            events.refresh().await?;
            let enabled = matches!(state, Switch::On);
            events.toggle(&event_key, enabled).await?;
            println!("{} is now {}", event_key, if enabled { "on" } else { "off" });
        }

        Command::EventConfig {
            event_key,
            min,
            max,
            winners,
            trigger,
        } => {
            let events = EventsModel::new(client);
            events.refresh().await?;
            let config = EventConfig {
                price_min: min,
                price_max: max,
                winners_count: winners,
                trigger_value: trigger,
            };
            events.save_config(&event_key, config).await?;
            println!("Saved settings for {}", event_key);
        }

        Command::ApplyAll { min, max, winners } => {
            let events = EventsModel::new(client);
            events.refresh().await?;
            let report = events
                .apply_all(BulkEventSettings {
                    price_min: min,
                    price_max: max,
                    winners_count: winners,
                })
                .await?;
            println!("Applied to {} events", report.applied.len());
            for (event_key, error) in &report.failed {
                println!("  {}: {}", event_key, error);
            }
        }

        Command::PriceRange { min, max } => {
            let settings = LisSkinsModel::new(client);
            settings.set_price_range(min, max).await?;
            println!("Price range set to {:.2}..{:.2}", min, max);
        }

        Command::Streamer { id, prizes_page } => {
            let model = StreamerPageModel::new(client, id);
            let page = model.load().await?;
            let profile = &page.profile;
            println!("{} [{}]", profile.streamer.name(), profile.streamer.id);
            if profile.live.is_live {
                println!(
                    "  Live: {} viewers{}",
                    profile.live.viewer_count,
                    profile
                        .live
                        .game_name
                        .as_deref()
                        .map(|g| format!(", {}", g))
                        .unwrap_or_default()
                );
            } else {
                println!("  Offline");
            }
            println!(
                "  Prizes: {} (${:.2}), this stream: {} to {} participants",
                profile.stats.total_prizes,
                profile.stats.total_amount,
                profile.stats.stream_prizes,
                profile.stats.stream_participants
            );
            println!("  Tracked: {}", if page.tracked { "yes" } else { "no" });
            if let Some(page_index) = prizes_page {
                let prizes = model.prizes_page(page_index).await?;
                println!(
                    "  Prize page {}/{}",
                    page_index + 1,
                    prizes.page_count(giveaway_sync::screens::streamer::PRIZES_PAGE_SIZE).max(1)
                );
                for prize in prizes.items {
                    println!(
                        "    {} -> {} ({})",
                        prize.skin_name.as_deref().unwrap_or("?"),
                        prize.twitch_login.as_deref().unwrap_or("?"),
                        prize.status()
                    );
                }
            }
        }

        Command::Live => {
            for streamer in client.live_streamers().await?.streamers {
                let name = streamer
                    .twitch_display_name
                    .as_deref()
                    .or(streamer.twitch_login.as_deref())
                    .unwrap_or("?");
                println!("[{}] {} ({} viewers)", streamer.id, name, streamer.viewer_count);
            }
        }

        Command::Followers => {
            let stats = client.follower_stats().await?;
            if !stats.has_data {
                println!("No follower data yet.");
            }
            for days in [5, 15, 30] {
                let total: u64 = stats.range(days).iter().map(|p| p.count).sum();
                println!("Last {} days: {} new followers", days, total);
            }
        }

        Command::Track { login } => {
            client.track_streamer(&login).await?;
            println!("Tracking {}", login);
        }

        Command::Untrack { id } => {
            client.untrack_streamer(id).await?;
            println!("Stopped tracking streamer {}", id);
        }

        Command::Purchase { id, watch, timeout } => {
            let tracker = PurchaseTracker::new(client.clone(), id, config.polling.purchase_interval());
            let state = if watch {
                let refresh = start_background_refresh(client, config.polling.purchase_interval());
                let state = tracker.watch(Duration::from_secs(timeout)).await;
                drop(refresh);
                state?
            } else {
                tracker.check().await?
            };
            let status = state
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("Purchase {}: {}", id, status);
            if let Some(name) = &state.skin_name {
                println!("  Item: {}", name);
            }
            if let Some(error) = &state.error {
                println!("  Error: {}", error);
            }
        }

        Command::Prizes { limit } => {
            let prizes = client.recent_prizes(limit).await?;
            for prize in prizes.items {
                let skin = prize.skin_name.as_deref().unwrap_or("?");
                let winner = prize.winner_twitch_login.as_deref().unwrap_or("?");
                let price = prize
                    .skin_price
                    .map(|p| format!(" (${:.2})", p))
                    .unwrap_or_default();
                println!("{}{} -> {}", skin, price, winner);
            }
        }
    }

    Ok(())
}
