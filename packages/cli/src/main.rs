#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the pride event preprocessor.
//!
//! Reads the form export, geocodes every event location against Nominatim
//! and writes the file the dashboard map reads.
//!
//! Uses `indicatif-log-bridge` (via [`pride_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the progress bar never fight for the terminal.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use pride_map_cli_utils::EventProgress;
use pride_map_geocoder::Resolver;
use pride_map_geocoder::nominatim::NominatimGeocoder;
use pride_map_geocoder::service_registry::{NominatimService, nominatim_service};
use pride_map_preprocess::RunOptions;

/// Host of the public Nominatim instance, which allows one request per second.
const PUBLIC_NOMINATIM_HOST: &str = "nominatim.openstreetmap.org";

#[derive(Parser)]
#[command(
    name = "pride_map_preprocess",
    about = "Geocodes the pride event export for the dashboard map"
)]
struct Cli {
    /// Log debug output (cleaned addresses, cache hits) unless `RUST_LOG` is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the export, geocode every location and write the enriched CSV
    Geocode {
        /// Raw form export
        #[arg(long, default_value = "events.csv")]
        input: PathBuf,
        /// Enriched output (replaced if it exists)
        #[arg(long, default_value = "events_with_coordinates.csv")]
        output: PathBuf,
        /// Force an export schema id instead of detecting it (see `schemas`)
        #[arg(long)]
        schema: Option<String>,
        /// Nominatim search endpoint
        #[arg(long)]
        base_url: Option<String>,
        /// `User-Agent` sent to the geocoder
        #[arg(long)]
        user_agent: Option<String>,
        /// Minimum delay between geocoding requests in milliseconds
        #[arg(long)]
        rate_limit_ms: Option<u64>,
        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Comma-separated ISO country codes to restrict matches to (e.g. "dk")
        #[arg(long)]
        country_codes: Option<String>,
        /// Send addresses to the geocoder exactly as written
        #[arg(long)]
        no_address_cleaning: bool,
    },
    /// List the known export schemas
    Schemas,
}

fn service_config(
    base_url: Option<String>,
    user_agent: Option<String>,
    rate_limit_ms: Option<u64>,
    timeout_secs: Option<u64>,
    country_codes: Option<String>,
) -> NominatimService {
    let mut service = nominatim_service();
    if let Some(base_url) = base_url {
        service.base_url = base_url;
    }
    if let Some(user_agent) = user_agent {
        service.user_agent = user_agent;
    }
    if let Some(rate_limit_ms) = rate_limit_ms {
        service.rate_limit_ms = rate_limit_ms;
    }
    if let Some(timeout_secs) = timeout_secs {
        service.timeout_secs = timeout_secs;
    }
    if country_codes.is_some() {
        service.country_codes = country_codes;
    }
    service
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = pride_map_cli_utils::init_logger(if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    match cli.command {
        Commands::Schemas => {
            println!("{:<15} {:<25} REQUIRED COLUMNS", "ID", "NAME");
            println!("{}", "-".repeat(80));
            for schema in pride_map_preprocess::schema::all_schemas() {
                println!(
                    "{:<15} {:<25} {}",
                    schema.id,
                    schema.name,
                    schema.required_columns().join(", ")
                );
            }
        }
        Commands::Geocode {
            input,
            output,
            schema,
            base_url,
            user_agent,
            rate_limit_ms,
            timeout_secs,
            country_codes,
            no_address_cleaning,
        } => {
            let service = service_config(
                base_url,
                user_agent,
                rate_limit_ms,
                timeout_secs,
                country_codes,
            );

            if service.base_url.contains(PUBLIC_NOMINATIM_HOST) && service.rate_limit_ms < 1000 {
                log::warn!(
                    "Rate limit of {}ms is below the public Nominatim usage policy (1 request/second)",
                    service.rate_limit_ms
                );
            }

            log::info!(
                "Geocoding via {} ({}), {}ms between requests, {}s timeout",
                service.name,
                service.base_url,
                service.rate_limit_ms,
                service.timeout_secs
            );

            let geocoder = NominatimGeocoder::new(&service)?;
            let mut resolver = Resolver::new(geocoder, service.min_delay())
                .with_address_cleaning(!no_address_cleaning);

            let options = RunOptions {
                input,
                output,
                schema,
            };

            let start = Instant::now();
            let progress = EventProgress::start(&multi, &options.input.display().to_string());
            let summary = pride_map_preprocess::run(&options, &mut resolver, &progress).await?;

            log::info!(
                "Wrote {} events to {} in {:.1}s ({} of {} lookups resolved, {} repeats served from cache)",
                summary.rows,
                options.output.display(),
                start.elapsed().as_secs_f64(),
                summary.geocoding.resolved,
                summary.geocoding.attempted,
                summary.geocoding.cached
            );
        }
    }

    Ok(())
}
