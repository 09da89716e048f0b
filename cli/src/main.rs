//! hitball - offline inspection CLI for the hit-game data file.
//!
//! Reads the same snapshot the bot writes and renders leaderboards, stat
//! sheets, and achievement reports without going through the chat
//! transport.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hitball_core::config::BotConfig;
use hitball_core::progress;
use hitball_core::{CounterStore, IdentityKey, JsonFileStorage};
use hitball_types::formatting::{format_pct_ratio, progress_bar};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Inspect hitball game data")]
struct Cli {
    /// Snapshot file to read (defaults to the configured data file)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Config file location
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the top targets
    Leaderboard {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Stat sheet for one target (numeric id, @handle, or handle:name key)
    Stats { target: String },
    /// Unlocked achievements for one target
    Achievements { target: String },
}

/// Initialize logging, writing to HITBALL_LOG_PATH if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var("HITBALL_LOG_PATH") {
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(file)
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_logging();
    let cli = Cli::parse();

    let config = BotConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let data_file = cli.data_file.unwrap_or_else(|| config.data_file.clone());

    let storage = JsonFileStorage::new(&data_file);
    let store = CounterStore::open(storage).await.map_err(|e| e.to_string())?;

    match cli.command {
        Commands::Leaderboard { limit } => {
            let limit = limit.unwrap_or(config.leaderboard_limit);
            show_leaderboard(&store, limit);
        }
        Commands::Stats { target } => {
            let key = resolve_target(&store, &target)?;
            show_stats(&store, &key);
        }
        Commands::Achievements { target } => {
            let key = resolve_target(&store, &target)?;
            show_achievements(&store, &key);
        }
    }
    Ok(())
}

/// Map a CLI target argument to an identity key: `@handle` looks up the
/// handle index, anything else must parse as a key.
fn resolve_target(
    store: &CounterStore<JsonFileStorage>,
    target: &str,
) -> Result<IdentityKey, String> {
    if let Some(handle) = target.strip_prefix('@') {
        return store
            .find_by_handle(handle)
            .cloned()
            .or_else(|| {
                // An unmerged provisional record may still sit under the
                // handle key itself
                let key = IdentityKey::from_handle(handle);
                store.get(&key).map(|_| key)
            })
            .ok_or_else(|| format!("no record for @{handle}"));
    }
    target
        .parse()
        .map_err(|_| format!("not a user id, @handle, or handle:<name> key: {target}"))
}

fn show_leaderboard(store: &CounterStore<JsonFileStorage>, limit: usize) {
    let rows = store.leaderboard(limit);
    if rows.is_empty() {
        println!("No hits recorded yet.");
        return;
    }

    let total = store.total_hits();
    let top = rows[0].1.count;
    println!("Top {} targets ({} hits total)", rows.len(), total);
    for (i, (_, record)) in rows.iter().enumerate() {
        println!(
            "{:>3}. {:<24} {:>6}  {}  {}",
            i + 1,
            record.display_name,
            record.count,
            progress_bar(record.count, top, 12),
            format_pct_ratio(record.count, total),
        );
    }
}

fn show_stats(store: &CounterStore<JsonFileStorage>, key: &IdentityKey) {
    let stats = progress::stats_for(store, key);

    println!("{}", stats.display_name);
    println!("  hits:   {}", stats.count);
    match stats.rank {
        Some(rank) => println!("  rank:   #{rank} of {}", store.record_count()),
        None => println!("  rank:   unranked"),
    }
    println!("  status: {}", stats.tier.label());
    if let Some((milestone, remaining)) = stats.next_milestone {
        println!(
            "  next:   {milestone} ({remaining} to go) {}",
            progress_bar(stats.count, milestone, 12)
        );
    }
}

fn show_achievements(store: &CounterStore<JsonFileStorage>, key: &IdentityKey) {
    let stats = progress::stats_for(store, key);

    println!(
        "{} - {} unlocked",
        stats.display_name,
        stats.achievements.len()
    );
    for achievement in &stats.achievements {
        println!("  {} - {}", achievement.name, achievement.description);
    }
    if let Some((milestone, remaining)) = stats.next_milestone {
        println!("  next milestone: {milestone} ({remaining} hits away)");
    }
}
