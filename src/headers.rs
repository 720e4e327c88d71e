// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security header construction for HTML document responses.

use crate::config::CspConfig;
use crate::csp::directives::{UPGRADE_INSECURE_REQUESTS, VIDEO_ORIGINS};
use crate::csp::{create_csp_directives, serialize_csp_directives, CspMode, DirectiveOptions};

pub const CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";
pub const CONTENT_SECURITY_POLICY_REPORT_ONLY: &str = "Content-Security-Policy-Report-Only";
pub const PERMISSIONS_POLICY: &str = "Permissions-Policy";
pub const REFERRER_POLICY: &str = "Referrer-Policy";
pub const X_CONTENT_TYPE_OPTIONS: &str = "X-Content-Type-Options";
pub const X_FRAME_OPTIONS: &str = "X-Frame-Options";
pub const STRICT_TRANSPORT_SECURITY: &str = "Strict-Transport-Security";

/// Two years, with subdomains, eligible for the preload list.
pub const HSTS_VALUE: &str = "max-age=63072000; includeSubDomains; preload";

/// Features no page on the site uses.
const DENIED_FEATURES: &[&str] = &[
    "camera",
    "microphone",
    "payment",
    "usb",
    "geolocation",
    "display-capture",
];

/// Features needed by embedded video players.
const VIDEO_FEATURES: &[&str] = &["accelerometer", "autoplay", "fullscreen", "gyroscope"];

/// A single response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityHeader {
    pub key: &'static str,
    pub value: String,
}

impl SecurityHeader {
    fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Every header produced for one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityHeaders {
    pub csp_header: Option<SecurityHeader>,
    pub csp_report_only_header: Option<SecurityHeader>,
    pub additional_headers: Vec<SecurityHeader>,
}

impl SecurityHeaders {
    /// All present headers, policy headers first.
    pub fn iter(&self) -> impl Iterator<Item = &SecurityHeader> {
        self.csp_header
            .iter()
            .chain(self.csp_report_only_header.iter())
            .chain(self.additional_headers.iter())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|h| h.key.eq_ignore_ascii_case(key))
            .map(|h| h.value.as_str())
    }
}

/// Inputs to [`build_security_headers`].
#[derive(Debug, Clone)]
pub struct HeaderOptions<'a> {
    pub directives: DirectiveOptions<'a>,
    pub mode: CspMode,
}

impl<'a> HeaderOptions<'a> {
    pub fn from_config(config: &'a CspConfig, nonce: &'a str, mode: CspMode) -> Self {
        Self {
            directives: DirectiveOptions {
                nonce,
                allow_unsafe_inline_scripts: config.allow_unsafe_inline_scripts,
                allow_unsafe_eval: config.allow_unsafe_eval,
                disable_upgrade_insecure_requests: config.disable_upgrade_insecure_requests,
                report_uri: config.report_uri.as_deref(),
                environment: config.environment,
            },
            mode,
        }
    }
}

/// `Permissions-Policy` value: sensitive features off, video features
/// limited to self and the embed origins.
pub fn permissions_policy() -> String {
    let allow_list = std::iter::once("self".to_string())
        .chain(VIDEO_ORIGINS.iter().map(|origin| format!("\"{origin}\"")))
        .collect::<Vec<_>>()
        .join(" ");

    DENIED_FEATURES
        .iter()
        .map(|feature| format!("{feature}=()"))
        .chain(
            VIDEO_FEATURES
                .iter()
                .map(|feature| format!("{feature}=({allow_list})")),
        )
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the policy headers for `options.mode` plus the hardening headers.
pub fn build_security_headers(options: &HeaderOptions<'_>) -> SecurityHeaders {
    let directives = create_csp_directives(&options.directives);

    let csp_header = options.mode.emits_enforcing().then(|| {
        SecurityHeader::new(CONTENT_SECURITY_POLICY, serialize_csp_directives(&directives))
    });

    // Browsers ignore upgrade-insecure-requests in report-only policies.
    let csp_report_only_header = options.mode.emits_report_only().then(|| {
        let mut report_only = directives.clone();
        report_only.remove(UPGRADE_INSECURE_REQUESTS);
        SecurityHeader::new(
            CONTENT_SECURITY_POLICY_REPORT_ONLY,
            serialize_csp_directives(&report_only),
        )
    });

    let mut additional_headers = vec![
        SecurityHeader::new(PERMISSIONS_POLICY, permissions_policy()),
        SecurityHeader::new(REFERRER_POLICY, "strict-origin-when-cross-origin"),
        SecurityHeader::new(X_CONTENT_TYPE_OPTIONS, "nosniff"),
        SecurityHeader::new(X_FRAME_OPTIONS, "SAMEORIGIN"),
    ];
    if options.directives.environment.is_production() {
        additional_headers.push(SecurityHeader::new(STRICT_TRANSPORT_SECURITY, HSTS_VALUE));
    }

    SecurityHeaders {
        csp_header,
        csp_report_only_header,
        additional_headers,
    }
}
