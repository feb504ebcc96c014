use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use insider_session_features::commands;
use insider_session_features::commands::extract::ExtractOptions;
use insider_session_features::config::FeatureConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "session-features")]
#[command(about = "Session feature extraction for insider-threat detection", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild sessions from weekly event tables and write feature rows
    ///
    /// Weeks are processed in parallel. A failing week is reported and the
    /// others are still written; the command then exits with an error.
    Extract {
        /// Weekly event tables (.csv, .csv.gz, .csv.zst); the week number is
        /// the leading number of the file name
        #[arg(required = true)]
        week_files: Vec<String>,

        /// Roster JSON (users, attributes, insider ground truth)
        #[arg(long)]
        roster: String,

        /// Directory for per-week outputs
        #[arg(long)]
        output_dir: String,

        /// Merged output file (default: <output-dir>/sessions.csv)
        #[arg(short, long)]
        output: Option<String>,

        /// Feature settings JSON file
        #[arg(long)]
        config: Option<String>,

        /// Emit min/max/median/mean/std per numeric field
        #[arg(long)]
        detailed_stats: bool,

        /// Worker threads (default: all cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Write every rejected input record to this CSV file
        #[arg(long)]
        rejects: Option<String>,
    },

    /// Concatenate week outputs after checking that their headers match
    Merge {
        /// Week output tables, in the order they should appear
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Merged output file
        #[arg(short, long)]
        output: String,
    },

    /// Print the output column list
    Schema {
        /// Layout with min/max/median/mean/std per numeric field
        #[arg(long)]
        detailed_stats: bool,
    },

    /// Generate shell completion scripts
    GenerateCompletion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            week_files,
            roster,
            output_dir,
            output,
            config,
            detailed_stats,
            jobs,
            rejects,
        } => {
            if let Some(threads) = jobs {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build_global()
                    .context("Failed to configure worker threads")?;
            }

            let mut feature_config = match config {
                Some(path) => FeatureConfig::load(&path)?,
                None => FeatureConfig::default(),
            };
            if detailed_stats {
                feature_config.detailed_stats = true;
            }

            let options = ExtractOptions {
                output: output.map(PathBuf::from),
                rejects: rejects.map(PathBuf::from),
                config: feature_config,
                progress: true,
                ..ExtractOptions::new(roster, output_dir)
            };
            commands::extract::run(&week_files, &options)
        }
        Commands::Merge { inputs, output } => commands::merge::run(&inputs, &output),
        Commands::Schema { detailed_stats } => commands::schema::run(detailed_stats),
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "session-features", &mut std::io::stdout());
            Ok(())
        }
    }
}
