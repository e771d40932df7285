//! Run the PetFriends scenario suite against a live service and print a report.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use petfriends_core::{run_suite, scenarios, suite, PetFriends, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "petfriends-check")]
#[command(about = "Check a PetFriends deployment against the scenario suite")]
struct Args {
    /// Service root, overrides PETFRIENDS_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Read settings from this file instead of `.env`
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Run only the named scenario (repeatable)
    #[arg(long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// Print scenario names and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.list {
        for scenario in scenarios::ALL {
            println!("{}", scenario.name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut settings = match &args.env_file {
        Some(path) => Settings::from_env_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::from_env().context("loading settings from the environment")?,
    };
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }

    let selected = suite::select(scenarios::ALL, &args.only).map_err(|e| anyhow!(e))?;
    info!(base_url = %settings.base_url, scenarios = selected.len(), "running suite");

    let api = PetFriends::from_settings(&settings);
    let report = run_suite(&api, &settings.fixtures, &selected);
    println!("{report}");

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
