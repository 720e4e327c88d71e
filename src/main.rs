// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Marketing site server with lifecycle-staged CSP headers.

use csp_lifecycle::{config::Config, csp::CspMode, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        site_dir = %config.site_dir.display(),
        environment = ?config.csp.environment,
        "Starting site server"
    );

    if config.csp.disabled {
        tracing::warn!("CSP_DISABLE=1: security headers will not be applied");
    } else {
        let forced = config.csp.env_mode.as_deref().and_then(CspMode::parse);
        tracing::info!(
            default_stage = %config.csp.default_stage(),
            forced_mode = forced.map(|m| m.as_str()).unwrap_or("-"),
            report_uri = config.csp.report_uri.as_deref().unwrap_or("-"),
            "CSP configured"
        );
    }

    let state = Arc::new(AppState::new(config.clone()));

    // Build router
    let app = csp_lifecycle::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("csp_lifecycle=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
