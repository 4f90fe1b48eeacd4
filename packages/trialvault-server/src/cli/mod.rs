use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::ServerConfig;
use crate::storage::{AssetStore, TrialStore};
use trialvault_core::aggregate::{group_assets, overview, GroupKey};
use trialvault_core::export::{export_assets, ExportFormat};
use trialvault_core::filter::{AssetFilter, Sort};
use trialvault_core::model::format_bytes;

/// TrialVault Server - Clinical-trial asset management API
#[derive(Parser)]
#[command(name = "trialvault-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server (default)
    Serve,

    /// Dump asset records to a file
    Export {
        /// Output format: csv, json or html
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// File to write
        #[arg(short, long)]
        output: PathBuf,

        /// Limit to one trial by protocol code
        #[arg(long)]
        trial: Option<String>,
    },

    /// Print overview statistics for the asset inventory
    Stats {
        /// Limit to one trial by protocol code
        #[arg(long)]
        trial: Option<String>,
    },
}

async fn trial_filter(
    trial_store: &Arc<dyn TrialStore>,
    protocol_code: Option<String>,
) -> anyhow::Result<AssetFilter> {
    let mut filter = AssetFilter::default();
    if let Some(code) = protocol_code {
        let trial = trial_store
            .get_trial_by_code(&code)
            .await
            .with_context(|| format!("Failed to resolve trial {}", code))?;
        filter.trial_id = Some(trial.id);
    }
    Ok(filter)
}

/// `export` command: fetch records through the storage layer and run the
/// export pipeline into a local file.
pub async fn run_export(
    config: &ServerConfig,
    trial_store: Arc<dyn TrialStore>,
    asset_store: Arc<dyn AssetStore>,
    format: String,
    output: PathBuf,
    trial: Option<String>,
) -> anyhow::Result<()> {
    let format = ExportFormat::parse(&format)?;
    let filter = trial_filter(&trial_store, trial).await?;

    let (records, total) = asset_store
        .list_records(&filter, Sort::default(), config.max_export_rows, 0)
        .await?;
    if total > records.len() as u64 {
        eprintln!(
            "Warning: export truncated to {} of {} matching rows",
            records.len(),
            total
        );
    }

    let bytes = export_assets(&records, format)?;
    std::fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {} records to {}", records.len(), output.display());
    Ok(())
}

/// `stats` command: print the overview table to stdout.
pub async fn run_stats(
    config: &ServerConfig,
    trial_store: Arc<dyn TrialStore>,
    asset_store: Arc<dyn AssetStore>,
    trial: Option<String>,
) -> anyhow::Result<()> {
    let filter = trial_filter(&trial_store, trial).await?;
    let (records, _) = asset_store
        .list_records(&filter, Sort::default(), config.max_export_rows, 0)
        .await?;

    let stats = overview(&records);
    println!("Assets:          {}", stats.asset_count);
    println!("Subjects:        {}", stats.subject_count);
    println!("Sites:           {}", stats.site_count);
    println!("Total size:      {}", format_bytes(stats.total_bytes));
    println!(
        "Review progress: {} pending, {} approved, {} rejected, {} query",
        stats.review_counts.pending,
        stats.review_counts.approved,
        stats.review_counts.rejected,
        stats.review_counts.query
    );

    let by_country = group_assets(&records, GroupKey::Country);
    if !by_country.is_empty() {
        println!();
        println!("{:<10} {:>8} {:>10} {:>10}", "Country", "Assets", "Reviewed", "Size");
        println!("{}", "-".repeat(42));
        for group in by_country {
            println!(
                "{:<10} {:>8} {:>10} {:>10}",
                group.key,
                group.asset_count,
                group.reviewed_count,
                format_bytes(group.total_bytes)
            );
        }
    }

    Ok(())
}
