use clap::Parser;
use seat_planner::app::{health_url, probe_health};
use seat_planner::config::{ADDRESS_ENV, DEFAULT_ADDRESS, DEFAULT_PORT, PORT_ENV};
use seat_planner::utils::logger;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "seat-planner-healthcheck")]
#[command(about = "Probe the seat planner health endpoint; exits non-zero when unhealthy")]
struct Args {
    #[arg(long = "server-port", env = PORT_ENV, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long = "server-address", env = ADDRESS_ENV, default_value = DEFAULT_ADDRESS)]
    address: String,

    /// Full URL to probe, overrides address and port
    #[arg(long)]
    url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 3)]
    timeout: u64,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let url = args
        .url
        .clone()
        .unwrap_or_else(|| health_url(&args.address, args.port));
    tracing::debug!("Probing {}", url);

    match probe_health(&url, Duration::from_secs(args.timeout)).await {
        Ok(body) => {
            println!("✅ healthy: {}", body.trim());
        }
        Err(e) => {
            eprintln!("❌ unhealthy: {}", e);
            std::process::exit(1);
        }
    }
}
