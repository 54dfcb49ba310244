//! Sanitext CLI
//!
//! Command-line interface for sanitizing files, previewing detections and
//! recovering originals from their encrypted artifacts.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sanitext_core::Category;
use sanitext_engine::{CategoryFilter, JobConfig, SanitizeOptions};
use sanitext_vault::DEFAULT_ITERATIONS;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sanitext")]
#[command(about = "Reversible sensitive-data sanitizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize one or more files, writing sanitized copies and recovery artifacts
    Sanitize {
        /// Files to sanitize
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory sanitized files and artifacts are written into
        #[arg(long, short, default_value = ".")]
        output: PathBuf,

        /// Password protecting the recovery artifacts
        #[arg(long, short, env = "SANITEXT_PASSWORD", hide_env_values = true)]
        password: String,

        /// YAML document with custom pattern rules
        #[arg(long)]
        patterns: Option<PathBuf>,

        /// Only detect these categories (comma separated, e.g. email,ip_address)
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// PBKDF2 iteration count for artifact keys
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: u32,

        /// Per-file deadline in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Number of files processed concurrently
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },
    /// Restore a sanitized file from its recovery artifact
    Recover {
        /// The sanitized file
        sanitized: PathBuf,

        /// Its recovery artifact
        artifact: PathBuf,

        /// Where the restored text is written
        #[arg(long, short)]
        output: PathBuf,

        /// Password the artifact was sealed with
        #[arg(long, short, env = "SANITEXT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show what would be replaced, without replacing anything
    Preview {
        /// File to scan
        file: PathBuf,

        /// YAML document with custom pattern rules
        #[arg(long)]
        patterns: Option<PathBuf>,
    },
}

fn category_filter(names: Option<Vec<String>>) -> CategoryFilter {
    match names {
        None => CategoryFilter::All,
        Some(names) => CategoryFilter::Only(
            names
                .into_iter()
                .map(Category::from)
                .collect::<HashSet<_>>(),
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sanitize {
            files,
            output,
            password,
            patterns,
            categories,
            iterations,
            timeout,
            concurrency,
        } => {
            let options = SanitizeOptions {
                custom_pattern_source: patterns,
                iteration_count: iterations,
                enabled_categories: category_filter(categories),
                timeout: timeout.map(Duration::from_secs),
            };
            let mut config = JobConfig::new(output);
            config.max_concurrency = concurrency;

            let results =
                sanitext_engine::sanitize_files(files, password, options, config).await?;

            let mut failures = 0usize;
            for (input, result) in &results {
                match result {
                    Ok(done) => {
                        info!(
                            input = %input.display(),
                            sanitized = %done.sanitized_path.display(),
                            artifact = %done.artifact_path.display(),
                            matches = done.matches,
                            "sanitized"
                        );
                        println!(
                            "{}: {} replacements -> {}",
                            input.display(),
                            done.matches,
                            done.sanitized_path.display()
                        );
                    }
                    Err(err) => {
                        failures += 1;
                        eprintln!("{}: {}", input.display(), err);
                    }
                }
            }

            if failures > 0 {
                anyhow::bail!("{} of {} files failed", failures, results.len());
            }
        }
        Commands::Recover {
            sanitized,
            artifact,
            output,
            password,
        } => {
            let verdict =
                sanitext_engine::recover_file(&sanitized, &artifact, &password, &output, None)
                    .await?;

            println!("restored -> {}", output.display());
            if verdict.passed {
                println!("integrity check passed ({})", verdict.expected);
            } else {
                eprintln!(
                    "integrity check FAILED: expected {}, got {}",
                    verdict.expected, verdict.actual
                );
                std::process::exit(2);
            }
        }
        Commands::Preview { file, patterns } => {
            let text = std::fs::read_to_string(&file)?;
            let options = SanitizeOptions {
                custom_pattern_source: patterns,
                ..Default::default()
            };
            let (detections, stats) = sanitext_engine::preview(&text, &options)?;

            for detection in &detections {
                println!(
                    "{:>5}..{:<5} {:<14} {}",
                    detection.start,
                    detection.end,
                    detection.category.to_string(),
                    detection.text
                );
            }
            for warning in &stats.warnings {
                eprintln!("warning: {}", warning);
            }
            println!(
                "{} detections across {} categories",
                stats.total_detections,
                stats.by_category.len()
            );
        }
    }

    Ok(())
}
