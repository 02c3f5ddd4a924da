//! # TaskFlow Server
//!
//! Runs the in-memory TaskFlow store as a long-lived process. On startup it
//! loads configuration, optionally seeds a demo workspace and subscribes a
//! logger to every project channel so store activity shows up in the logs.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=taskflow_server=debug cargo run -p taskflow-server
//! ```

use taskflow_server::{app::AppState, config::ServerConfig, live, seed};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("TaskFlow Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config);

    if state.config.seed_demo_data {
        let mut db = state.db.write().await;
        let summary = seed::seed_demo_data(&mut db)?;
        tracing::info!(
            users = summary.user_ids.len(),
            tasks = summary.task_ids.len(),
            "Demo data ready"
        );
    }

    let channels = live::project_channels(&*state.db.read().await);
    let logger = live::spawn_event_logger(&state.broadcaster, channels);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, exiting...");

    logger.abort();

    Ok(())
}
