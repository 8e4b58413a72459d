use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use coinmail_ingest::EmlReader;
use coinmail_report::{BatchReport, run, run_convert, run_report};
use log::debug;
use std::path::PathBuf;

mod config;

use config::{Overrides, load_config};

#[derive(Parser, Debug)]
#[command(
    name = "coinmail",
    version,
    about = "Turn exported exchange notification emails into trade and funding CSV reports"
)]
struct Cli {
    /// Config file (defaults to ./coinmail.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log per-file details
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Exit non-zero if any file failed, after writing the reports
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct RowArgs {
    /// Zero-indexed body row holding the trade sentence (default: 5)
    #[arg(long)]
    trade_row: Option<usize>,

    /// Zero-indexed body row holding the deposit/withdrawal sentence (default: 4)
    #[arg(long)]
    funding_row: Option<usize>,
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Folder containing the exported messages (default: ./Data)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Folder for converted text files and reports; created if missing (default: ./Data)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Message file extension (default: eml)
    #[arg(long)]
    extension: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert every message, then build trades.csv and funding.csv
    Run {
        #[command(flatten)]
        paths: SourceArgs,
        #[command(flatten)]
        rows: RowArgs,
    },

    /// Convert messages into per-category text files only
    Convert {
        #[command(flatten)]
        paths: SourceArgs,
    },

    /// Rebuild the reports from text files already under the output folder
    Report {
        /// Output folder from a previous convert (default: ./Data)
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        rows: RowArgs,
    },
}

fn overrides(paths: SourceArgs, rows: RowArgs) -> Overrides {
    Overrides {
        source_dir: paths.source,
        output_dir: paths.output,
        extension: paths.extension,
        trade_row: rows.trade_row,
        funding_row: rows.funding_row,
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file = load_config(cli.config.as_deref())?;

    let report = match cli.command {
        Command::Run { paths, rows } => {
            let config = file.resolve(overrides(paths, rows));
            debug!("resolved {config:?}");
            run(&config, &EmlReader)?
        }
        Command::Convert { paths } => {
            let config = file.resolve(overrides(paths, RowArgs::default()));
            debug!("resolved {config:?}");
            run_convert(&config, &EmlReader)?
        }
        Command::Report { output, rows } => {
            let paths = SourceArgs {
                output,
                ..SourceArgs::default()
            };
            let config = file.resolve(overrides(paths, rows));
            debug!("resolved {config:?}");
            run_report(&config.output_dir, config.rows)?
        }
    };

    print_summary(&report);

    if cli.strict && report.has_failures() {
        bail!("{} file(s) failed", report.failures.len());
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    if report.discovered > 0 || report.converted > 0 {
        println!(
            "Converted {}/{} messages ({} unclassified, see Unclassified/)",
            report.converted, report.discovered, report.unclassified
        );
    }
    if report.scanned > 0 || report.trades > 0 || report.funding > 0 {
        println!(
            "Extracted {} trades and {} funding rows from {} files",
            report.trades, report.funding, report.scanned
        );
    }

    if report.has_failures() {
        println!("\n{} file(s) skipped:", report.failures.len());
        for err in &report.failures {
            println!("- {err}");
        }
    }
}
