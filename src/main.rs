use clap::Parser;
use closest_relays::config::Settings;
use closest_relays::core::{parse_directory, RelayFinder};
use closest_relays::services::{ConfiguredPinger, DirectoryClient, LocationClient};
use closest_relays::{table, ClosestError, Coordinate, ProtocolType};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Show the VPN relays closest to you, fastest first
#[derive(Debug, Parser)]
#[command(name = "closest-relays", version)]
struct Cli {
    /// Only show servers of a particular type
    #[arg(short = 's', long, value_parser = ["openvpn", "wireguard"])]
    server_type: Option<String>,

    /// Only show servers within this distance (km) from myself [default: 500]
    #[arg(short = 'm', long)]
    max_distance: Option<f64>,

    /// Per-probe timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum number of probes in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Read the relay directory from this file
    #[arg(long)]
    relays_file: Option<PathBuf>,

    /// Use this latitude instead of looking up the current location
    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,

    /// Use this longitude instead of looking up the current location
    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,

    /// Configuration file to load instead of config/default.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// CLI flags override configured values
    fn apply(&self, settings: &mut Settings) {
        if let Some(max_distance) = self.max_distance {
            settings.ranking.max_distance_km = max_distance;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.probe.timeout_ms = timeout_ms.max(1);
        }
        if let Some(concurrency) = self.concurrency {
            settings.probe.concurrency = concurrency.max(1);
        }
        if let Some(path) = &self.relays_file {
            settings.directory.path = Some(path.clone());
        }
    }

    fn protocol(&self) -> Option<ProtocolType> {
        self.server_type.as_deref().and_then(|s| s.parse().ok())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut settings);

    init_logging(&settings);

    match run(&cli, &settings).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

async fn run(cli: &Cli, settings: &Settings) -> Result<String, ClosestError> {
    let directory = DirectoryClient::new(&settings.directory)?.load().await?;
    let candidates = parse_directory(&directory, cli.protocol())?;

    let origin = match (cli.latitude, cli.longitude) {
        (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude)?,
        _ => LocationClient::new(&settings.location)?.current_location().await?,
    };

    info!(
        candidates = candidates.len(),
        %origin,
        max_distance_km = settings.ranking.max_distance_km,
        "Searching for closest relays"
    );

    let pinger = ConfiguredPinger::from_method(settings.probe.method, settings.probe.tcp_port);
    let finder = RelayFinder::new(pinger, settings.probe.probe_settings());
    let result = finder
        .find(candidates, origin, settings.ranking.max_distance_km)
        .await;

    Ok(table::render(&result.relays))
}
