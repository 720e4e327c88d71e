// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup and passed down explicitly; the CSP
//! code never touches the process environment itself.

use crate::csp::{CspLifecycleStage, CspMode, Environment};
use std::env;
use std::path::PathBuf;

/// Default target for browser violation reports.
pub const DEFAULT_REPORT_URI: &str = "/api/csp-report";

/// CSP subsystem configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspConfig {
    /// `CSP_DISABLE=1` skips header application entirely.
    pub disabled: bool,
    /// Raw `CSP_MODE`; invalid values are ignored at resolution time.
    pub env_mode: Option<String>,
    /// Raw `CSP_LIFECYCLE_STAGE`.
    pub lifecycle_stage: Option<String>,
    pub allow_unsafe_inline_scripts: bool,
    pub allow_unsafe_eval: bool,
    pub disable_upgrade_insecure_requests: bool,
    /// `None` or empty omits the `report-uri` directive.
    pub report_uri: Option<String>,
    pub environment: Environment,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            env_mode: None,
            lifecycle_stage: None,
            allow_unsafe_inline_scripts: false,
            allow_unsafe_eval: false,
            disable_upgrade_insecure_requests: false,
            report_uri: Some(DEFAULT_REPORT_URI.to_string()),
            environment: Environment::Development,
        }
    }
}

impl CspConfig {
    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| lookup(name).is_some_and(|v| v.trim() == "1");
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = Environment::parse(lookup("NODE_ENV").as_deref());

        let env_mode = non_empty("CSP_MODE");
        if let Some(mode) = env_mode.as_deref() {
            if CspMode::parse(mode).is_none() {
                tracing::warn!(value = %mode, "Ignoring unrecognized CSP_MODE");
            }
        }
        let lifecycle_stage = non_empty("CSP_LIFECYCLE_STAGE");
        if let Some(stage) = lifecycle_stage.as_deref() {
            if CspLifecycleStage::parse(stage).is_none() {
                tracing::warn!(value = %stage, "Ignoring unrecognized CSP_LIFECYCLE_STAGE");
            }
        }

        Self {
            disabled: flag("CSP_DISABLE"),
            env_mode,
            lifecycle_stage,
            allow_unsafe_inline_scripts: flag("CSP_ALLOW_UNSAFE_INLINE")
                || environment.is_development(),
            allow_unsafe_eval: flag("CSP_ALLOW_UNSAFE_EVAL"),
            disable_upgrade_insecure_requests: flag("CSP_DISABLE_UPGRADE_INSECURE_REQUESTS"),
            // Set-but-empty disables reporting; unset uses the default sink.
            report_uri: match lookup("CSP_REPORT_URI") {
                Some(v) => Some(v.trim().to_string()).filter(|v| !v.is_empty()),
                None => Some(DEFAULT_REPORT_URI.to_string()),
            },
            environment,
        }
    }

    /// Stage used when a request does not name a valid one.
    pub fn default_stage(&self) -> CspLifecycleStage {
        self.lifecycle_stage
            .as_deref()
            .and_then(CspLifecycleStage::parse)
            .unwrap_or_else(|| self.environment.default_stage())
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Directory holding the exported site (HTML templates and assets)
    pub site_dir: PathBuf,
    pub csp: CspConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            None => 8080,
        };

        Ok(Self {
            port,
            site_dir: lookup("SITE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            csp: CspConfig::from_lookup(&lookup),
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            site_dir: PathBuf::from("public"),
            csp: CspConfig {
                environment: Environment::Test,
                ..CspConfig::default()
            },
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
