//! TrustMesh CLI
//!
//! Scores identities from a feed of signed third-party attestations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use trustmesh_core::{ScoreResult, ScoringConfig};
use trustmesh_source::{FeedSource, GuardedSource, SourceConfig};
use trustmesh_walker::TrustScorer;

#[derive(Parser)]
#[command(name = "trustmesh")]
#[command(author, version, about = "TrustMesh: trust scores from decentralized attestations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3); RUST_LOG overrides when set
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one or more identities
    Score {
        /// Identity (public key) to score; repeat for several
        #[arg(short, long, required = true)]
        identity: Vec<String>,

        /// Attestation feed (JSON array or JSON lines)
        #[arg(short, long)]
        feed: PathBuf,

        /// Attestation hops to follow when weighting issuers (0 = direct only)
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        depth: i64,

        /// Scoring configuration file (TOML)
        #[arg(short, long, env = "TRUSTMESH_CONFIG")]
        config: Option<PathBuf>,

        /// Per-fetch timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,

        /// Retries for failed fetches
        #[arg(long, default_value = "2")]
        retries: u32,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize an attestation feed
    Inspect {
        /// Attestation feed (JSON array or JSON lines)
        #[arg(short, long)]
        feed: PathBuf,
    },

    /// Print the default scoring configuration as TOML
    Defaults,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact();

    match EnvFilter::try_from_default_env() {
        Ok(filter) => builder.with_env_filter(filter).init(),
        Err(_) => builder.with_max_level(log_level).init(),
    }

    match cli.command {
        Commands::Score {
            identity,
            feed,
            depth,
            config,
            timeout,
            retries,
            json,
        } => {
            run_score(&identity, feed, depth, config, timeout, retries, json).await?;
        }
        Commands::Inspect { feed } => {
            inspect_feed(feed).await?;
        }
        Commands::Defaults => {
            print!("{}", ScoringConfig::default().to_toml_string()?);
        }
    }

    Ok(())
}

async fn run_score(
    identities: &[String],
    feed: PathBuf,
    depth: i64,
    config: Option<PathBuf>,
    timeout: u64,
    retries: u32,
    json: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => ScoringConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScoringConfig::default(),
    };
    debug!("Scoring config: {:?}", config);

    let feed = FeedSource::load(&feed)
        .await
        .with_context(|| format!("loading feed {}", feed.display()))?;

    let source = GuardedSource::new(
        feed,
        SourceConfig {
            timeout_secs: timeout,
            max_retries: retries,
        },
    );
    let scorer = TrustScorer::with_config(Arc::new(source), config);

    let names: Vec<&str> = identities.iter().map(String::as_str).collect();
    let results = scorer.score_many(&names, depth).await?;

    if json {
        let out = if results.len() == 1 {
            serde_json::to_string_pretty(&results[0])?
        } else {
            serde_json::to_string_pretty(&results)?
        };
        println!("{}", out);
    } else {
        for result in &results {
            print_result(result);
        }
    }

    Ok(())
}

fn print_result(result: &ScoreResult) {
    println!("🔑 {}", result.identity);
    println!(
        "   Score: {}/100 ({}) | raw {:.4}",
        result.display, result.tier, result.raw
    );
    println!(
        "   Attestations: {} from {} issuers | depth {}",
        result.attestation_count, result.diversity, result.depth
    );
    if !result.type_breakdown.is_empty() {
        let breakdown = result
            .type_breakdown
            .iter()
            .map(|(label, count)| format!("{} x{}", label, count))
            .collect::<Vec<_>>()
            .join(", ");
        println!("   Types: {}", breakdown);
    }
    if result.fetch_failures > 0 {
        println!(
            "   ⚠️  {} fetches failed; affected issuers counted as untrusted",
            result.fetch_failures
        );
    }
    println!();
}

async fn inspect_feed(path: PathBuf) -> Result<()> {
    let feed = FeedSource::load(&path)
        .await
        .with_context(|| format!("loading feed {}", path.display()))?;
    let summary = feed.summary();

    println!("📄 Feed: {}", path.display());
    println!("   Accepted: {}", summary.accepted);
    println!("   Dropped: {}", summary.dropped_total());
    for (reason, count) in &summary.dropped {
        println!("     - {}: {}", reason, count);
    }
    println!("   Subjects: {}", summary.subjects);
    println!("   Types:");
    for (label, count) in &summary.types {
        println!("     - {}: {}", label, count);
    }

    Ok(())
}
