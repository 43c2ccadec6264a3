//! Ambience Analyzer - loudness profiling for ambient sound assets
use ambience_analyzer::{AnalyzerConfig, ProfileService, ProfileSource};
use ambience_loudness::LoudnessAnalyzer;
use ambience_storage::{PlaybackProfile, ProfileStore};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ambience-analyzer")]
#[command(about = "Measure ambient sound assets and cache their playback profiles", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "AMBIENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze files whose profiles are missing or stale
    Analyze {
        /// Audio files to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show the stored profile for an asset
    Show {
        /// Asset id (file name)
        asset_id: String,
    },
    /// Remove the stored profile for an asset
    Forget {
        /// Asset id (file name)
        asset_id: String,
    },
    /// List all stored profiles
    List,
}

fn print_profile(profile: &PlaybackProfile) {
    println!(
        "{:<40} {:>7.1} LUFS {:>7.1} dBTP {:>+7.2} dB{}",
        profile.asset_id,
        profile.integrated_lufs,
        profile.true_peak_dbtp,
        profile.gain_db,
        if profile.needs_limiter { "  [limiter]" } else { "" }
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AnalyzerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store_dir = config.store_directory()?;
    let store = Arc::new(
        ProfileStore::open_or_recover(&store_dir)
            .with_context(|| format!("Failed to open profile store in {}", store_dir.display()))?,
    );
    let service = ProfileService::new(Arc::clone(&store), LoudnessAnalyzer::new());

    match cli.command {
        Commands::Analyze { paths } => {
            let results = service.ensure_profiles(&paths, config.analysis.workers)?;
            let mut failed = 0;

            for (path, result) in results {
                match result {
                    Ok((profile, source)) => {
                        print_profile(&profile);
                        if source == ProfileSource::Cached {
                            tracing::debug!("{} was already up to date", path.display());
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {}", path.display(), e);
                    }
                }
            }

            if failed > 0 {
                anyhow::bail!("{} of {} files could not be analyzed", failed, paths.len());
            }
        }
        Commands::Show { asset_id } => {
            let profile = store
                .get(&asset_id)
                .with_context(|| format!("No profile stored for {}", asset_id))?;
            print_profile(&profile);
            println!("  hash:     {}", profile.file_hash.as_deref().unwrap_or("-"));
            println!("  analyzed: {}", profile.analysis_date.to_rfc3339());
            println!("  version:  {}", profile.analysis_version);
        }
        Commands::Forget { asset_id } => match service.forget(&asset_id)? {
            Some(_) => println!("Removed profile for {}", asset_id),
            None => println!("No profile stored for {}", asset_id),
        },
        Commands::List => {
            for profile in store.all() {
                print_profile(&profile);
            }
        }
    }

    drop(service);
    let store = Arc::try_unwrap(store)
        .map_err(|_| anyhow::anyhow!("Profile store still in use at shutdown"))?;
    store.close().context("Failed to flush profile store")?;

    Ok(())
}
