use clap::{Parser, Subcommand};
use errand_runner::config::Config;
use errand_runner::places::PlaceResolver;
use errand_runner::pricing::FallbackPolicy;
use errand_runner::server;
use errand_runner::tracking::{start_tracking, TrackingUpdate};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Errand runner — route pricing and delivery tracking
///
/// Estimates distance and a suggested price between two places, simulates
/// live tracking of a delivery, and serves both over a JSON API.
///
/// Examples:
///   errand estimate --from "123 Main St, Harare" --to Avondale
///   errand estimate --from -17.8292,31.0522 --to -17.8216,31.0492
///   errand estimate --from "Unknown Rd" --to Harare --fallback
///   errand track --interval-ms 500
///   errand serve --port 8080
#[derive(Parser)]
#[command(name = "errand", version, about, long_about = None)]
struct Cli {
    /// Config file (JSON). Defaults to ~/.errand/config.json if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Estimate distance and suggested price for a route.
    Estimate {
        /// Pickup: place name, street address or "lat,lon".
        #[arg(long, allow_hyphen_values = true)]
        from: String,

        /// Dropoff: place name, street address or "lat,lon".
        #[arg(long, allow_hyphen_values = true)]
        to: String,

        /// Use a random 5–25 km distance when either end has no coordinates.
        #[arg(long)]
        fallback: bool,
    },

    /// Simulate live tracking of a delivery until it is delivered.
    Track {
        /// Tick interval in milliseconds (default from config: 3000).
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Starting progress in [0, 1].
        #[arg(long)]
        start: Option<f64>,

        /// Seed for the simulated runner position.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Start the HTTP API.
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// List known places.
    Places,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ERRAND_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| fail(e));

    match cli.command {
        Command::Estimate { from, to, fallback } => run_estimate(&config, &from, &to, fallback),
        Command::Track { interval_ms, start, seed } => {
            if let Some(ms) = interval_ms {
                config.tracking.interval_ms = ms;
            }
            if let Some(p) = start {
                config.tracking.initial_progress = p;
            }
            config.validate().unwrap_or_else(|e| fail(e));
            run_track(&config, seed).await;
        }
        Command::Serve { host, port } => {
            if let Some(h) = host {
                config.server.host = h;
            }
            if let Some(p) = port {
                config.server.port = p;
            }
            let addr = format!("{}:{}", config.server.host, config.server.port);
            server::start(config)
                .await
                .unwrap_or_else(|e| fail(format!("Server on {}: {}", addr, e)));
        }
        Command::Places => run_places(&config),
    }
}

fn run_estimate(config: &Config, from: &str, to: &str, fallback: bool) {
    let resolver = PlaceResolver::new(config.places.clone());

    let pickup = resolver.resolve(from).unwrap_or_else(|e| fail(e));
    let dropoff = resolver.resolve(to).unwrap_or_else(|e| fail(e));

    for (label, input, place) in [("Pickup", from, &pickup), ("Dropoff", to, &dropoff)] {
        match place {
            Some(p) => eprintln!("  {}: {} \u{2192} {} ({}, {})", label, input, p.name, p.coordinate, p.source),
            None => eprintln!("  {}: {} \u{2192} no coordinates", label, input),
        }
    }

    let route = pickup
        .as_ref()
        .zip(dropoff.as_ref())
        .map(|(a, b)| (a.coordinate, b.coordinate));
    let policy = if fallback { FallbackPolicy::Random } else { FallbackPolicy::Refuse };

    let estimate = config
        .tariff
        .estimate_route(route, policy, &mut rand::thread_rng())
        .unwrap_or_else(|e| fail(e));

    eprintln!("  {}", estimate.summary());

    match serde_json::to_string_pretty(&estimate) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

async fn run_track(config: &Config, seed: Option<u64>) {
    let feed = config.tracking.jitter_feed(seed);

    let handle = start_tracking(&config.tracking, feed, |u: &TrackingUpdate| {
        eprintln!(
            "  [{:>2}] {:>3}% {:<24} ETA {:<9} runner {}",
            u.tick,
            u.state.percent_complete(),
            u.headline,
            u.state.eta_label,
            u.runner,
        );
        match serde_json::to_string(u) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("cannot serialize update: {}", e),
        }
    });

    tokio::select! {
        state = handle.finished() => {
            if let Some(state) = state {
                eprintln!("  {} ({})", state.status, state.eta_label);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("  Tracking stopped.");
        }
    }
}

fn run_places(config: &Config) {
    let resolver = PlaceResolver::new(config.places.clone());
    let places: Vec<_> = resolver.places().collect();
    for p in &places {
        eprintln!("  \u{1F4CD} {:<16} {:<11} {}", p.name, p.region, p.coordinate);
    }
    match serde_json::to_string_pretty(&places) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}
