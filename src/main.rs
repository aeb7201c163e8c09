use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

mod client;
mod config;
mod distinct_id;
mod errors;
mod interactive;
mod ledger;
mod models;
mod search;
mod session;
mod storage;

#[cfg(test)]
mod client_tests;

use crate::client::{ApiClient, DEFAULT_SEARCH_LIMIT, UreqTransport};
use crate::config::load_config;
use crate::distinct_id::DistinctIdProvider;
use crate::ledger::{DEFAULT_SHOWN_CAP, ShownIdLedger};
use crate::models::{DEFAULT_RECOMMEND_COUNT, FeedbackEvent, MAX_SEEDS, PopularityMode, SeedSong};
use crate::session::RecommendSession;
use crate::storage::open_storage;

#[derive(Parser)]
#[command(name = "offtrack")]
#[command(about = "Seed-song music recommendations from the Offtrack API")]
#[command(version)]
struct Args {
    /// Log debug details (search failures, storage problems, request summaries)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Keep shown tracks and the distinct id in memory only
    #[arg(long = "ephemeral", global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend and its recommender are up
    Ping,

    /// Look up songs to use as seeds
    Search {
        query: String,

        #[arg(short = 'l', long = "limit", default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Get recommendations for up to three seed songs
    Recommend {
        /// Seed song title (repeat up to three times)
        #[arg(short = 's', long = "seed", required = true)]
        seeds: Vec<String>,

        #[arg(short = 'n', long = "count", default_value_t = DEFAULT_RECOMMEND_COUNT)]
        count: u32,

        /// all, indie or mainstream
        #[arg(short = 'm', long = "mode", default_value = "all")]
        mode: PopularityMode,

        /// Ignore previously shown tracks for this request
        #[arg(long = "fresh")]
        fresh: bool,
    },

    /// Send feedback about a recommended track
    Feedback {
        track_id: String,

        /// like, dislike, play, open_spotify or click_recommendation
        event: FeedbackEvent,
    },

    /// List tracks already shown on this device
    Shown {
        #[arg(long = "max", default_value_t = DEFAULT_SHOWN_CAP)]
        max: usize,
    },

    /// Print this installation's anonymous id
    Id,

    /// Pick seeds interactively with live search suggestions
    Pick {
        #[arg(short = 'n', long = "count", default_value_t = DEFAULT_RECOMMEND_COUNT)]
        count: u32,

        #[arg(short = 'm', long = "mode", default_value = "all")]
        mode: PopularityMode,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Load configuration from .env
    let config = load_config()?;

    let storage = open_storage(config.storage_dir().as_deref(), args.ephemeral);
    let ledger = ShownIdLedger::new(Arc::clone(&storage));
    let distinct_id = DistinctIdProvider::new(storage).get_distinct_id();

    let client = ApiClient::new(
        UreqTransport::new(&config),
        config.api_base.clone(),
        Some(distinct_id.clone()),
    );

    match args.command {
        Command::Ping => {
            println!("Testing API connection...");
            match client.ping() {
                Ok(status) if status.ok && status.recommender_ready => {
                    println!("✓ API connection successful, recommender ready");
                }
                Ok(status) => {
                    println!("✓ API connection successful");
                    println!("✗ Recommender not ready: {}", status.recommender_error);
                }
                Err(e) => {
                    eprintln!("✗ API connection failed: {e}");
                    return Err(e);
                }
            }
        }

        Command::Search { query, limit } => {
            let results = client.search(&query, limit);
            for (i, result) in results.iter().enumerate() {
                let id_display = result
                    .id
                    .as_deref()
                    .map(|id| format!(" | ID: {id}"))
                    .unwrap_or_default();
                println!("{}. {}{}", i + 1, result.display_label(), id_display);
            }
        }

        Command::Recommend {
            seeds,
            count,
            mode,
            fresh,
        } => {
            if seeds.len() > MAX_SEEDS {
                return Err(anyhow::anyhow!(
                    "At most {} seed songs are allowed, got {}",
                    MAX_SEEDS,
                    seeds.len()
                ));
            }
            let seeds: Vec<SeedSong> = seeds.iter().filter_map(|s| SeedSong::from_text(s)).collect();

            let mut session = RecommendSession::new(mode, count);
            if fresh {
                session.already_shown_override = Some(Vec::new());
            }
            let Some(params) = session.begin(seeds) else {
                return Err(anyhow::anyhow!(
                    "{}",
                    session.error().unwrap_or("Request not allowed")
                ));
            };

            println!("Finding {} {} recommendations...", params.count, params.mode);
            let outcome = client.recommend(&params, &ledger);
            session.complete(outcome, &ledger);

            if let Some(message) = session.error() {
                eprintln!("✗ {message}");
                return Err(anyhow::anyhow!("Recommendation request failed: {}", message));
            }
            interactive::print_recommendations(session.recommendations());
        }

        Command::Feedback { track_id, event } => {
            client.send_feedback(&track_id, event);
            println!("Feedback sent (best effort)");
        }

        Command::Shown { max } => {
            let ids = ledger.read_with_cap(max);
            println!("{} tracks already shown", ids.len());
            for id in ids {
                println!("  {id}");
            }
        }

        Command::Id => println!("{}", client.distinct_id().unwrap_or(&distinct_id)),

        Command::Pick { count, mode } => {
            interactive::run(
                Arc::new(client),
                Arc::new(ledger),
                RecommendSession::new(mode, count),
            )?;
        }
    }

    Ok(())
}
