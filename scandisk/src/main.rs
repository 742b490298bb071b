//! CLI front-end for the scan-and-repair engine.
//!
//! Parses a single positional image path plus a couple of additive
//! flags (`--dry-run`, `-v`), runs the driver, and maps the result onto
//! an exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use scandisk::mapper::MappedImage;
use scandisk::{driver, ScandiskError};

/// Checks a FAT12 disk image for consistency and repairs what it can.
#[derive(Parser, Debug)]
#[command(name = "scandisk", version, about)]
struct Cli {
    /// Path to the disk image to check.
    image_path: PathBuf,

    /// Run every pass but never write the image back.
    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Increase log verbosity (-v for info, -vv for debug).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ScandiskError::Usage(msg)) => {
            log::error!("{msg}");
            ExitCode::from(1)
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ScandiskError> {
    if cli.dry_run {
        let mut image = std::fs::read(&cli.image_path).map_err(|source| ScandiskError::Io {
            path: cli.image_path.clone(),
            source,
        })?;
        let report = driver::run(&mut image)?;
        log_report(&report);
        log::info!("dry run: image left untouched");
        Ok(())
    } else {
        let mut mapped = MappedImage::open(&cli.image_path)?;
        let report = driver::run(&mut mapped)?;
        mapped.flush()?;
        log_report(&report);
        Ok(())
    }
}

fn log_report(report: &driver::RunReport) {
    if report.is_clean() {
        log::info!("scan complete: no anomalies found");
        return;
    }
    log::info!(
        "scan complete: {} LESS, {} MORE, {} DEAD, {} DUPE, {} orphan(s) adopted, {} ghost pointer(s) fixed, {} bad-but-pointed",
        report.less,
        report.more,
        report.dead,
        report.dupe,
        report.orphans_adopted,
        report.ghost_pointers_fixed,
        report.bad_but_pointed,
    );
}
