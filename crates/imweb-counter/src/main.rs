//! Counter demo for the imweb engine.
//!
//! Serves a page with a number and two buttons. Each browser tab gets its
//! own counter; clicking `Increment` or `Decrement` updates it on the next
//! frame.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `imweb-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Serve until SIGINT or SIGTERM

use std::path::Path;

use anyhow::Context as _;
use imweb_core::Context;
use imweb_core::config::ImwebConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "imweb-config.yaml";

/// Per-session application state.
#[derive(Debug, Clone, Default)]
struct Counter {
    count: i64,
}

/// Declare the page for one frame.
fn render(ctx: &mut Context<'_, Counter>) {
    let count = ctx.state().count;
    ctx.text("count-text", count.to_string());
    if ctx.button("Increment") {
        ctx.state_mut().count = ctx.state().count.saturating_add(1);
    }
    if ctx.button("Decrement") {
        ctx.state_mut().count = ctx.state().count.saturating_sub(1);
    }
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the server
/// fails to start.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, from_file) = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    if from_file {
        info!(path = CONFIG_PATH, "Configuration loaded");
    } else {
        info!("Config file not found, using defaults");
    }
    info!(
        host = %config.server.host,
        port = config.server.port,
        fps = config.frame.fps,
        "imweb-counter starting"
    );

    imweb_server::run(config, Counter::default(), render)
        .await
        .context("server failed")?;

    info!("imweb-counter stopped");
    Ok(())
}

/// Load configuration from `imweb-config.yaml`, falling back to defaults.
///
/// Returns whether the file was used. Environment overrides apply either way.
fn load_config() -> anyhow::Result<(ImwebConfig, bool)> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        let config = ImwebConfig::from_file(path)
            .with_context(|| format!("failed to load {CONFIG_PATH}"))?;
        Ok((config, true))
    } else {
        let mut config = ImwebConfig::default();
        config.server.apply_env_overrides();
        Ok((config, false))
    }
}
