//! Contact relay entry point.

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::api::{create_router, AppState};
use contact_relay::client::{present, RelayClient, REQUEST_FAILED_NOTICE};
use contact_relay::config::Config;
use contact_relay::metrics;
use contact_relay::submission::ContactSubmission;
use contact_relay::utils::shutdown_signal;

/// Contact form relay.
#[derive(Parser, Debug)]
#[command(name = "contact-relay")]
#[command(about = "Serves a contact form and relays submissions to an upstream API")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true, env = "VERBOSE")]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay server (default).
    Serve {
        /// Override the configured port.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Submit a contact to a running relay.
    Submit {
        /// Full URL of the relay endpoint.
        #[arg(long, env = "RELAY_URL", default_value = "http://127.0.0.1:8080/api/contact")]
        relay_url: String,

        /// Sender's full name.
        #[arg(long)]
        name: String,

        /// Sender's email address.
        #[arg(long)]
        email: String,

        /// Sender's phone number.
        #[arg(long)]
        phone: String,

        /// Message body.
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("contact_relay=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if args.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port).await,
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Submit {
            relay_url,
            name,
            email,
            phone,
            message,
        }) => cmd_submit(relay_url, ContactSubmission::new(name, email, phone, message)).await,
        None => cmd_serve(None).await,
    }
}

/// Load and validate configuration, logging failures.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CONTACT RELAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Upstream URL: {}", config.upstream_url);
    println!("  API Key: set ({} chars)", config.upstream_api_key.len());
    println!("  Upstream Timeout: {}ms", config.upstream_timeout_ms);
    println!("  Mask Upstream Errors: {}", config.mask_upstream_errors);
    println!("  Listen: {}", config.bind_addr());
    println!("  Relay Path: {}", config.relay_path);
    println!(
        "  CORS Origin: {}",
        config.cors_allow_origin.as_deref().unwrap_or("(none)")
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the relay server until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.port = port;
    }

    if config.mask_upstream_errors {
        warn!("MASK_UPSTREAM_ERRORS is set: upstream failures will be reported as success");
    }

    let mut state = AppState::new(&config)?;
    match metrics::install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!(error = %e, "metrics recorder not installed"),
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        relay_path = %config.relay_path,
        upstream = %config.upstream_url,
        "contact relay listening"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Submit one contact and print what the user would see.
async fn cmd_submit(relay_url: String, submission: ContactSubmission) -> anyhow::Result<()> {
    let client = RelayClient::new(relay_url);

    match client.submit(&submission).await {
        Ok(outcome) => {
            println!("{}", present(&outcome));
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "submission failed");
            println!("{}", REQUEST_FAILED_NOTICE);
            Err(e.into())
        }
    }
}
