//! Pylon Demo - Entry point

use std::path::PathBuf;

use tracing::{error, info};

use pylon_demo::{build_server, load_config, telemetry_config, DemoState};

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("pylon-demo {}", pylon_demo::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Pylon Demo - artist catalog and accounts

USAGE:
    pylon-demo [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    PYLON__SERVER__HTTP_ADDR          Listen address (default: 0.0.0.0:8080)
    PYLON__SERVER__MAX_BODY_BYTES     Request body cap (default: 1048576)
    PYLON__LOCALE__DEFAULT            Fallback locale (default: en)
    PYLON__LOCALE__SUPPORTED          Comma-separated locales (default: en,fr)
    PYLON__LOGGING__LEVEL             Log filter (default: info)
    PYLON__LOGGING__FORMAT            json or pretty (default: json)
    PYLON__METRICS__ENABLED           Serve Prometheus metrics (default: false)

Without --config, ./pylon.toml is read when present. A .env file in the
working directory is loaded before environment overrides apply.
"
    );
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load configuration before logging exists; report failures on stderr
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = pylon_telemetry::init_telemetry(&telemetry_config(&config)) {
        eprintln!("Failed to initialize telemetry: {e}");
        std::process::exit(1);
    }

    let server = match build_server(&config, &DemoState::default()) {
        Ok(server) => server,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        version = pylon_demo::VERSION,
        addr = %config.server.http_addr,
        routes = server.router().route_count(),
        "Starting pylon-demo"
    );

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("pylon-demo stopped");
}
