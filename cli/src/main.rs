use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use fragrate::batch::{self, BatchOptions};
use fragrate::{config, export};

#[derive(Parser)]
#[command(name = "fragrate")]
#[command(about = "Per player statistics and ratings for recorded matches")]
#[command(version)]
struct Cli {
    /// TOML file with [weights] and [analysis] tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error), RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse recordings and write `<stem>_report.json` and `<stem>_stats.csv`
    Analyse {
        #[arg(required = true)]
        recordings: Vec<PathBuf>,

        /// Weights as kd=..,headshot_pct=..,adr=..,multikill=..,clutch=..
        #[arg(long)]
        weights: Option<String>,

        #[arg(long, default_value = "results")]
        out_dir: PathBuf,

        /// Aggregate the rounds of a recording in parallel
        #[arg(long)]
        parallel_rounds: bool,
    },

    /// Rate a stored report again with different weights
    Rate {
        report: PathBuf,

        #[arg(long)]
        weights: String,

        /// Defaults to the directory of the report
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let file_config = config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Analyse {
            recordings,
            weights,
            out_dir,
            parallel_rounds,
        } => {
            let rating = file_config
                .rating(weights.as_deref())
                .context("resolving rating weights")?;

            let options = BatchOptions {
                settings: file_config.analysis.clone(),
                rating,
                out_dir,
                parallel_rounds,
            };

            tracing::info!(recordings = recordings.len(), "Starting analysis");
            let outcomes = batch::run(recordings, options).await;

            let mut failed = 0;
            for outcome in outcomes.iter() {
                match &outcome.result {
                    Ok(written) => {
                        tracing::info!(
                            path = %outcome.path.display(),
                            report = %written.json.display(),
                            stats = %written.csv.display(),
                            anomalies = written.report.anomalies.total(),
                            "Done"
                        );
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::error!(path = %outcome.path.display(), error = %e, "Failed");
                    }
                }
            }

            if failed > 0 {
                anyhow::bail!("{} of {} recordings failed", failed, outcomes.len());
            }
        }
        Commands::Rate {
            report,
            weights,
            out_dir,
        } => {
            let rating = file_config
                .rating(Some(&weights))
                .context("resolving rating weights")?;

            let stored = export::read_report(&report)?;
            let rerated = export::rerate(&stored, &rating).context("re-rating report")?;

            let out_dir = out_dir
                .or_else(|| report.parent().map(|p| p.to_owned()))
                .unwrap_or_else(|| PathBuf::from("."));
            let (json, csv) = export::write(&out_dir, &export::stem_of_report(&report), &rerated)
                .context("writing re-rated report")?;

            for player in rerated.leaderboard() {
                tracing::info!(
                    placement = player.placement,
                    name = %player.name,
                    rating = player.rating,
                    percentile = player.percentile,
                    tier = %player.tier,
                    "Standing"
                );
            }
            tracing::info!(report = %json.display(), stats = %csv.display(), "Wrote re-rated report");
        }
    }

    Ok(())
}
