use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use relscan::{
    config::{Config, IMAGE_REPO_ENV, SCAN_DIR_ENV},
    fetcher::{report_url, HttpReportFetcher},
    model::{Edition, ReleaseTag},
    report::ReportBuilder,
    scanner::{ScanOrchestrator, ScanSettings, SystemRunner},
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const FATAL_SCAN: u8 = 3;
}

#[derive(Parser)]
#[command(name = "relscan")]
#[command(
    author,
    version,
    about = "Scan release images for CVEs and build release security reports"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Markdown CVE report for a list of releases
    Report {
        /// Product edition the tags belong to
        #[arg(short, long, value_enum, default_value = "oss")]
        edition: Edition,

        /// Release tags, newest first
        #[arg(required = true)]
        tags: Vec<String>,

        /// Override the report bucket URL
        #[arg(long)]
        bucket_url: Option<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scan release images and upload the results to code scanning
    Scan {
        /// Release tags to scan (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        tags: Vec<String>,

        /// Images to scan for every tag (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        images: Vec<String>,

        /// Subdirectory of the scan directory to write results under
        #[arg(long)]
        suffix: String,

        /// Root directory for scan results (overrides SCAN_DIR)
        #[arg(long)]
        scan_dir: Option<PathBuf>,

        /// Image registry prefix (overrides IMAGE_REPO)
        #[arg(long)]
        image_repo: Option<String>,

        /// Skip uploading results to code scanning
        #[arg(long)]
        no_upload: bool,

        /// Disable the progress spinner
        #[arg(long)]
        no_progress: bool,
    },

    /// List the images shipped by a release
    Images {
        #[arg(short, long, value_enum, default_value = "oss")]
        edition: Edition,

        /// Release tag
        #[arg(short, long)]
        tag: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(e) => {
            if let Some(err) = e.downcast_ref::<relscan::Error>() {
                if err.is_fatal_scan() {
                    error!(error = %err, "Scan run aborted");
                    return ExitCode::from(exit_codes::FATAL_SCAN);
                }
            }
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "relscan=debug" } else { "relscan=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(command: Commands) -> Result<()> {
    // `config` must keep working when the file itself is broken
    let load = || Config::load().context("failed to load config");

    match command {
        Commands::Report {
            edition,
            tags,
            bucket_url,
            output,
        } => {
            let bucket_url = match bucket_url {
                Some(url) => url,
                None => load()?.report.bucket_url,
            };
            let builder = ReportBuilder::new(HttpReportFetcher::new(), edition, bucket_url);

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    let mut out = BufWriter::new(file);
                    builder.write_report(&tags, &mut out).await?;
                    out.flush()?;
                    info!(path = %path.display(), "Report written");
                }
                None => {
                    let mut out = io::stdout();
                    builder.write_report(&tags, &mut out).await?;
                    out.flush()?;
                }
            }
            Ok(())
        }
        Commands::Scan {
            tags,
            images,
            suffix,
            scan_dir,
            image_repo,
            no_upload,
            no_progress,
        } => {
            let mut config = load()?;
            if let Some(dir) = scan_dir {
                config.scan.scan_dir = Some(dir);
            }
            if let Some(repo) = image_repo {
                config.scan.image_repo = Some(repo);
            }
            if no_upload {
                config.upload.enabled = false;
            }
            run_scan(&config, &tags, &images, &suffix, !no_progress)
        }
        Commands::Images { edition, tag, json } => list_images(&load()?, edition, &tag, json),
        Commands::Config { init, path } => handle_config(init, path),
    }
}

fn run_scan(
    config: &Config,
    tags: &[String],
    images: &[String],
    suffix: &str,
    show_progress: bool,
) -> Result<()> {
    let settings = ScanSettings::from_config(config)?;
    let orchestrator = ScanOrchestrator::new(settings, SystemRunner);

    let progress = if show_progress && io::stderr().is_terminal() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!(
            "Scanning {} images across {} releases...",
            images.len(),
            tags.len()
        ));
        Some(pb)
    } else {
        None
    };

    let result = orchestrator.run(tags, images, suffix);

    if let Some(pb) = progress {
        match &result {
            Ok(summary) => pb.finish_with_message(format!(
                "Scanned {}, skipped {}, uploaded {}",
                summary.scanned, summary.skipped, summary.uploaded
            )),
            Err(_) => pb.abandon(),
        }
    }

    result?;
    Ok(())
}

#[derive(Tabled, Serialize)]
struct ImageRow {
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "Report")]
    report: String,
}

fn list_images(config: &Config, edition: Edition, tag: &str, json: bool) -> Result<()> {
    let tag = ReleaseTag::parse(tag)?;
    let rows: Vec<ImageRow> = edition
        .images_for(tag.version())
        .into_iter()
        .map(|image| ImageRow {
            image: image.to_string(),
            report: report_url(&config.report.bucket_url, edition, &tag, image),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{} {} images:", edition, tag);
        println!();
        println!("{}", Table::new(rows).with(Style::rounded()).to_string());
    }
    Ok(())
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init && !config_path.exists() {
        Config::default().save()?;
        println!("Created {}", config_path.display());
    } else if init {
        println!("Keeping existing {}", config_path.display());
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => {
            println!("# {}", config_path.display());
            println!("{}", content);
        }
        Err(_) => {
            println!("# no config file at {}; defaults:", config_path.display());
            println!("{}", Config::generate_default_config());
            println!("# run 'relscan config --init' to write them");
        }
    }

    println!(
        "# {} and {} override scan.scan_dir and scan.image_repo",
        SCAN_DIR_ENV, IMAGE_REPO_ENV
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_config_path_does_not_load_config() {
        let command = Commands::Config {
            init: false,
            path: true,
        };
        assert!(run(command).await.is_ok());
    }

    #[test]
    fn test_cli_parses_scan_lists() {
        let cli = Cli::parse_from([
            "relscan", "scan", "--tags", "1.8.2,1.8.1", "--images", "gloo,discovery", "--suffix",
            "gloo",
        ]);
        match cli.command {
            Commands::Scan { tags, images, .. } => {
                assert_eq!(tags, vec!["1.8.2", "1.8.1"]);
                assert_eq!(images, vec!["gloo", "discovery"]);
            }
            _ => panic!("expected scan command"),
        }
    }
}
