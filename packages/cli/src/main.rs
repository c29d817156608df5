#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the bike map toolchain.
//!
//! `summarize` reads a station directory, neighborhood boundaries and
//! trip logs and writes the enriched station report. `profiles` writes
//! only the hour-of-day map, and `inspect` prints an existing report.
//!
//! Uses `indicatif-log-bridge` (via [`bike_map_cli_utils::init_logger`])
//! so log lines and the trip reading progress bar share the terminal.

mod config;

use std::path::PathBuf;

use bike_map_cli_utils::{IndicatifProgress, MultiProgress, init_logger};
use bike_map_ingest::neighborhoods::load_neighborhoods;
use bike_map_ingest::stations::load_stations;
use bike_map_ingest::trips::load_trips;
use bike_map_report::export::{ReportFormat, read_report, write_profiles, write_report};
use bike_map_report::pipeline::{Inputs, profiles_only, run};
use bike_map_report_models::Report;
use clap::{Args, Parser, Subcommand};

use crate::config::RunOptions;

#[derive(Parser)]
#[command(
    name = "bike_map",
    about = "Bike share station hourly profiles and neighborhood rankings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the enriched station report
    Summarize(SummarizeArgs),
    /// Write hour-of-day profiles without station or neighborhood data
    Profiles(ProfilesArgs),
    /// Print a summary of an existing JSON or `MessagePack` report
    Inspect {
        /// Report file
        report: PathBuf,
        /// Ranked stations shown per neighborhood
        #[arg(long, default_value_t = 3)]
        top: usize,
    },
}

#[derive(Args)]
struct SummarizeArgs {
    /// Station directory (GBFS `station_information.json` or CSV)
    #[arg(long)]
    stations: PathBuf,

    /// Neighborhood boundaries (`GeoJSON`)
    #[arg(long)]
    neighborhoods: PathBuf,

    /// Trip CSV files, plain or `.gz`
    #[arg(long, required = true, num_args = 1..)]
    trips: Vec<PathBuf>,

    /// Report output path
    #[arg(long)]
    output: PathBuf,

    /// Report format; inferred from the output extension when omitted
    #[arg(long)]
    format: Option<ReportFormat>,

    /// Also write the standalone hour-of-day map here
    #[arg(long)]
    profiles_output: Option<PathBuf>,

    /// Rank located stations that had no trips, with zero rides
    #[arg(long)]
    zero_fill: bool,

    /// Leave trips from stations missing in the directory out of profiles
    #[arg(long)]
    skip_unknown_stations: bool,

    #[command(flatten)]
    options: RunOptions,
}

#[derive(Args)]
struct ProfilesArgs {
    /// Trip CSV files, plain or `.gz`
    #[arg(long, required = true, num_args = 1..)]
    trips: Vec<PathBuf>,

    /// JSON output path
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    options: RunOptions,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize(args) => summarize(&multi, &args)?,
        Commands::Profiles(args) => profiles(&multi, &args)?,
        Commands::Inspect { report, top } => {
            for line in inspection_lines(&read_report(&report)?, top) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn summarize(
    multi: &MultiProgress,
    args: &SummarizeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = args.options.resolve()?;
    let mut config = file.summarize;
    if args.zero_fill {
        config.zero_fill_rankings = true;
    }
    if args.skip_unknown_stations {
        config.profile_unknown_stations = false;
    }

    let format = match args.format {
        Some(format) => format,
        None => ReportFormat::from_path(&args.output)?,
    };

    let stations = load_stations(&args.stations)?;
    let neighborhoods = load_neighborhoods(&args.neighborhoods, &file.neighborhood_fields)?;
    let trips = load_trips(
        &args.trips,
        &IndicatifProgress::records_bar(multi, "Reading trips"),
    )?;

    log::info!(
        "Summarizing {} trips ({} statistic, {} orientation)",
        trips.len(),
        config.statistic,
        config.orientation
    );

    let output = run(
        Inputs {
            stations: &stations,
            neighborhoods: &neighborhoods,
            trips: &trips,
        },
        &config,
    )?;

    write_report(&args.output, &output.report, format)?;
    if let Some(path) = &args.profiles_output {
        write_profiles(path, &output.profiles)?;
    }

    Ok(())
}

fn profiles(
    multi: &MultiProgress,
    args: &ProfilesArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.options.resolve()?.summarize;
    let trips = load_trips(
        &args.trips,
        &IndicatifProgress::records_bar(multi, "Reading trips"),
    )?;

    let profiles = profiles_only(&trips, &config)?;
    write_profiles(&args.output, &profiles)?;

    Ok(())
}

/// Human-readable summary of a report: run metadata, then each
/// neighborhood with its station count and best-ranked stations.
fn inspection_lines(report: &Report, top: usize) -> Vec<String> {
    let metadata = &report.metadata;
    let mut lines = vec![
        format!(
            "{} rides per hour, {} orientation",
            metadata.statistic, metadata.orientation
        ),
        format!(
            "Trips: {} total, {} profiled, {} ranked",
            metadata.total_trips, metadata.profiled_trips, metadata.ranked_trips
        ),
    ];
    if let (Some(first), Some(last)) = (metadata.first_trip, metadata.last_trip) {
        lines.push(format!("Period: {first} to {last}"));
    }
    lines.push(format!(
        "Stations: {} across {} neighborhoods",
        report.stations.len(),
        metadata.neighborhood_count
    ));

    for code in report.neighborhood_codes() {
        let stations = report.stations_in(code);
        let name = stations
            .first()
            .and_then(|s| s.neighborhood.as_ref())
            .map_or(code, |n| n.name.as_str());

        lines.push(String::new());
        lines.push(format!("{code} {name}: {} stations", stations.len()));
        for station in stations.iter().take(top) {
            let (Some(rank), Some(total)) = (station.rank, station.total_rides) else {
                break;
            };
            lines.push(format!(
                "  #{rank} {} ({}): {total} rides",
                station.name, station.short_code
            ));
        }
    }

    lines
}
