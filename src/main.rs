//! # Hackbot
//!
//! Hackathon participation bot: registration, teams, staged submissions
//! and deadline reminders over Telegram.
//!
//! Usage:
//!   hackbot run                   # Poll Telegram and run the reminder loop
//!   hackbot remind-now            # Run a single reminder tick and exit
//!   hackbot init-config           # Write a default config file
//!   hackbot seed-demo             # Insert a demo hackathon with three stages

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use hackbot_channels::TelegramChannel;
use hackbot_core::{Channel, HackbotConfig, Store};
use hackbot_db::{NewHackathon, NewStage, SqliteStore};
use hackbot_dialog::DialogController;
use hackbot_scheduler::{NotificationDispatcher, ReminderScheduler, spawn_reminder_loop};
use hackbot_teams::TeamRegistry;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hackbot",
    version,
    about = "🏁 Hackbot: hackathon registration, teams and deadline reminders"
)]
struct Cli {
    /// Config file (default: ~/.hackbot/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the bot
    Run,
    /// Run one reminder tick now and exit
    RemindNow,
    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Insert a demo hackathon with three stages
    SeedDemo,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn load_config(path: Option<&Path>) -> Result<HackbotConfig> {
    let config = match path {
        Some(path) => {
            let mut config = HackbotConfig::load_from(path)?;
            config.apply_env_overrides();
            config.validate()?;
            config
        }
        None => HackbotConfig::load()?,
    };
    Ok(config)
}

fn open_store(config: &HackbotConfig) -> Result<Arc<SqliteStore>> {
    let db_path = config.database.resolved_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    tracing::info!("🗄️ Database: {}", db_path.display());
    Ok(Arc::new(store))
}

fn build_scheduler(
    config: &HackbotConfig,
    store: Arc<dyn Store>,
    channel: Arc<dyn Channel>,
) -> Result<ReminderScheduler> {
    let dispatcher = NotificationDispatcher::new(
        channel,
        Duration::from_millis(config.scheduler.send_delay_ms),
    );
    Ok(ReminderScheduler::new(store, dispatcher, config.scheduler.tz()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "hackbot=debug,hackbot_core=debug,hackbot_db=debug,hackbot_teams=debug,hackbot_dialog=debug,hackbot_scheduler=debug,hackbot_channels=debug"
    } else {
        "hackbot=info,hackbot_core=info,hackbot_db=info,hackbot_teams=info,hackbot_dialog=info,hackbot_scheduler=info,hackbot_channels=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref().map(expand_path);

    match cli.command {
        Command::InitConfig { force } => {
            let path = config_path.unwrap_or_else(HackbotConfig::default_path);
            if path.exists() && !force {
                println!("⚠️  Config already exists at {} (use --force to overwrite)", path.display());
                return Ok(());
            }
            HackbotConfig::default().save_to(&path)?;
            println!("✅ Wrote default config to {}", path.display());
            println!("   Set telegram.bot_token (or BOT_TOKEN) before `hackbot run`.");
            Ok(())
        }
        Command::SeedDemo => {
            let config = load_config(config_path.as_deref())?;
            let store = open_store(&config)?;
            seed_demo(&store)?;
            Ok(())
        }
        Command::RemindNow => {
            let config = load_config(config_path.as_deref())?;
            let store = open_store(&config)?;
            let telegram = Arc::new(TelegramChannel::new(config.telegram.clone()));
            telegram.connect().await?;
            let scheduler = build_scheduler(&config, store, telegram)?;
            let report = scheduler.tick(Utc::now()).await?;
            println!(
                "🔔 Scanned {} stage(s): {} reminder(s) due, {} sent, {} failed",
                report.stages_scanned, report.reminders_recorded, report.sent, report.failed
            );
            Ok(())
        }
        Command::Run => run(load_config(config_path.as_deref())?).await,
    }
}

async fn run(config: HackbotConfig) -> Result<()> {
    let store = open_store(&config)?;
    let telegram = TelegramChannel::new(config.telegram.clone());
    telegram.connect().await.context("connecting to Telegram")?;
    let channel: Arc<dyn Channel> = Arc::new(telegram.clone());

    let registry = Arc::new(TeamRegistry::new(store.clone(), &config.teams));
    let controller = Arc::new(DialogController::new(
        store.clone(),
        registry,
        config.support.clone(),
    ));

    let scheduler = Arc::new(build_scheduler(&config, store, channel.clone())?);
    let reminders = tokio::spawn(spawn_reminder_loop(
        scheduler,
        config.scheduler.check_interval_secs,
    ));

    let mut updates = telegram.start_polling();
    tracing::info!("🏁 Hackbot is running. Press Ctrl-C to stop.");

    loop {
        tokio::select! {
            next = updates.next() => {
                let Some(msg) = next else {
                    tracing::warn!("📡 Update stream closed");
                    break;
                };
                let controller = controller.clone();
                let channel = channel.clone();
                tokio::spawn(async move {
                    for reply in controller.handle(msg).await {
                        let recipient = reply.recipient;
                        if let Err(e) = channel.send(reply).await {
                            tracing::warn!("📭 Reply to {recipient} failed: {e}");
                        }
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("🛑 Shutting down");
                break;
            }
        }
    }

    reminders.abort();
    Ok(())
}

fn seed_demo(store: &SqliteStore) -> Result<()> {
    let now = Utc::now();
    let hackathon = store.create_hackathon(&NewHackathon {
        name: "Demo Hackathon".into(),
        description: "A three-stage practice event.".into(),
        deadline: Some(now + chrono::Duration::days(14)),
        prize_pool: Some("$1,000".into()),
        is_active: true,
    })?;
    for (number, name, days) in [(1, "Idea", 3), (2, "Prototype", 7), (3, "Demo", 14)] {
        store.create_stage(&NewStage {
            hackathon_id: hackathon.id,
            number,
            name: name.into(),
            description: format!("Submit your {} link.", name.to_lowercase()),
            deadline: Some(now + chrono::Duration::days(days)),
            is_active: true,
        })?;
    }
    println!("✅ Seeded hackathon #{} \"{}\" with 3 stages", hackathon.id, hackathon.name);
    Ok(())
}
