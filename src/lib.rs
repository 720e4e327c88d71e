// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSP lifecycle: Content-Security-Policy headers for the marketing site.
//!
//! Every HTML navigation gets a fresh nonce and a policy whose enforcement
//! mode follows the deployment lifecycle stage (build → report-only,
//! pre-release → dual, release → enforce), with operator and per-request
//! overrides.

pub mod config;
pub mod csp;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod routes;

use config::Config;
use csp::NonceGenerator;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub nonce_generator: NonceGenerator,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            nonce_generator: NonceGenerator::default(),
        }
    }
}
