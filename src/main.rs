//! ORDERMON — order verification polling daemon.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! reports how many orders are waiting on disk, and runs the
//! load→verify→persist loop with graceful shutdown.

use anyhow::Result;
use secrecy::SecretString;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use ordermon::config;
use ordermon::engine::{PassReport, PollingEngine};
use ordermon::store::OrderStore;
use ordermon::verifier::HttpVerifier;

const BANNER: &str = r#"
  ___  ____  ____  _____ ____  __  __  ___  _   _
 / _ \|  _ \|  _ \| ____|  _ \|  \/  |/ _ \| \ | |
| | | | |_) | | | |  _| | |_) | |\/| | | | |  \| |
| |_| |  _ <| |_| | |___|  _ <| |  | | |_| | |\  |
 \___/|_| \_\____/|_____|_| \_\_|  |_|\___/|_| \_|

  Order Verification Polling Daemon
  v0.1.0
"#;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration; a missing file means defaults, a broken one
    // is fatal.
    let cfg = if Path::new(CONFIG_PATH).exists() {
        config::AppConfig::load(CONFIG_PATH)?
    } else {
        config::AppConfig::default()
    };

    // Initialise structured logging
    init_logging();

    println!("{BANNER}");
    info!(
        orders_file = %cfg.engine.orders_file,
        poll_interval_ms = cfg.engine.poll_interval_ms,
        base_url = %cfg.verifier.base_url,
        "ORDERMON starting up"
    );

    // -- Initialise components -------------------------------------------

    let token = match cfg.resolve_token() {
        Some(t) => Some(SecretString::new(t)),
        None => {
            warn!(
                token_env = %cfg.verifier.token_env,
                "No bearer token configured — verification calls will be unauthenticated"
            );
            None
        }
    };

    let verifier = HttpVerifier::new(
        &cfg.verifier.base_url,
        token,
        Duration::from_secs(cfg.verifier.request_timeout_secs),
    )?;

    let store = OrderStore::new(&cfg.engine.orders_file);

    // Startup summary before entering the loop.
    match store.load() {
        Ok(orders) => info!(count = orders.len(), "Orders waiting on disk"),
        Err(e) => warn!(error = %e, "Orders file unreadable at startup — will retry each pass"),
    }

    let engine = PollingEngine::new(store, Box::new(verifier));

    // -- Main loop -------------------------------------------------------

    let poll_interval = Duration::from_millis(cfg.engine.poll_interval_ms);
    let cooldown = Duration::from_millis(cfg.engine.error_cooldown_ms);
    let mut interval = tokio::time::interval(poll_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_ms = cfg.engine.poll_interval_ms,
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match engine.run_pass().await {
                    Ok(report) => log_pass_report(&report),
                    Err(e) => {
                        error!(error = %e, "Pass failed unexpectedly — cooling down before retry");
                        tokio::time::sleep(cooldown).await;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("ORDERMON shut down cleanly.");
    Ok(())
}

/// Log a human-readable pass summary.
fn log_pass_report(report: &PassReport) {
    if report.store_unreadable {
        warn!("Pass skipped: orders file unreadable");
        return;
    }
    info!(
        loaded = report.loaded,
        verified = report.verified,
        resolved = report.resolved,
        failed = report.failed,
        inconclusive = report.inconclusive,
        skipped = report.skipped,
        write_errors = report.write_errors,
        "Pass complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ordermon=info"));

    let json_logging = std::env::var("ORDERMON_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
