//! Case-record store and report generator for a low-threshold drug
//! services programme: clients, encounters, performed services and the
//! periodic print outputs built from them (RVKPP, hygiene authority,
//! per-service statistics).

pub mod config;
pub mod db;
pub mod models;
pub mod reporting;

use tracing_subscriber::EnvFilter;

/// Initializes tracing from `RUST_LOG`, falling back to the built-in
/// default filter. Call once at startup.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
