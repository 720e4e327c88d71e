// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSP enforcement modes, lifecycle stages and mode resolution.

use std::fmt;

/// Which policy header(s) a response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CspMode {
    /// `Content-Security-Policy` only.
    Enforce,
    /// `Content-Security-Policy-Report-Only` only.
    ReportOnly,
    /// Both headers.
    Dual,
}

impl CspMode {
    /// Parse a mode literal. Anything other than `enforce`, `report-only`
    /// or `dual` is treated as absent.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "enforce" => Some(Self::Enforce),
            "report-only" => Some(Self::ReportOnly),
            "dual" => Some(Self::Dual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enforce => "enforce",
            Self::ReportOnly => "report-only",
            Self::Dual => "dual",
        }
    }

    /// Whether the enforcing `Content-Security-Policy` header is emitted.
    pub fn emits_enforcing(&self) -> bool {
        matches!(self, Self::Enforce | Self::Dual)
    }

    /// Whether the `Content-Security-Policy-Report-Only` header is emitted.
    pub fn emits_report_only(&self) -> bool {
        matches!(self, Self::ReportOnly | Self::Dual)
    }
}

impl fmt::Display for CspMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment pipeline label used to pick a default mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CspLifecycleStage {
    Build,
    PreRelease,
    Release,
}

impl CspLifecycleStage {
    /// Parse a stage literal (`build`, `pre-release`, `release`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "build" => Some(Self::Build),
            "pre-release" => Some(Self::PreRelease),
            "release" => Some(Self::Release),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::PreRelease => "pre-release",
            Self::Release => "release",
        }
    }

    /// Default mode for this stage when nothing overrides it.
    pub fn default_mode(&self) -> CspMode {
        match self {
            Self::Build => CspMode::ReportOnly,
            Self::PreRelease => CspMode::Dual,
            Self::Release => CspMode::Enforce,
        }
    }
}

impl fmt::Display for CspLifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime environment, taken from `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    /// Unknown or missing values fall back to development.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("production") | Some("prod") => Self::Production,
            Some("test") => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Stage used when neither the request nor the configuration names one.
    pub fn default_stage(&self) -> CspLifecycleStage {
        if self.is_production() {
            CspLifecycleStage::Release
        } else {
            CspLifecycleStage::Build
        }
    }
}

/// Raw, unvalidated inputs to [`resolve_csp_mode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeInputs<'a> {
    /// Operator-forced mode (`CSP_MODE`).
    pub env_mode: Option<&'a str>,
    /// Lifecycle stage label.
    pub lifecycle_stage: Option<&'a str>,
    /// Per-request override (`x-csp-mode`).
    pub request_override_mode: Option<&'a str>,
}

/// Resolve the active mode. First valid value wins: environment mode,
/// request override, then the lifecycle stage default. Unknown stages map
/// to report-only.
pub fn resolve_csp_mode(inputs: &ModeInputs<'_>) -> CspMode {
    if let Some(mode) = inputs.env_mode.and_then(CspMode::parse) {
        return mode;
    }
    if let Some(mode) = inputs.request_override_mode.and_then(CspMode::parse) {
        return mode;
    }
    inputs
        .lifecycle_stage
        .and_then(CspLifecycleStage::parse)
        .map(|stage| stage.default_mode())
        .unwrap_or(CspMode::ReportOnly)
}
