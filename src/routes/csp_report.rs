// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSP violation report sink.
//!
//! Browsers post either the legacy `application/csp-report` body
//! (`{"csp-report": {...}}`) or a Reporting API batch
//! (`[{"type": "csp-violation", "body": {...}}]`). Both are normalized and
//! logged at `warn` so report-only policies can be tuned before enforcing.

use crate::AppState;
use axum::{body::Bytes, extract::DefaultBodyLimit, http::StatusCode, routing::post, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Largest accepted report body.
pub const MAX_REPORT_BYTES: usize = 64 * 1024;

/// CSP report routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/csp-report",
        post(csp_report).layer(DefaultBodyLimit::max(MAX_REPORT_BYTES)),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LegacyReport {
    document_uri: Option<String>,
    violated_directive: Option<String>,
    effective_directive: Option<String>,
    blocked_uri: Option<String>,
    source_file: Option<String>,
    line_number: Option<u32>,
    column_number: Option<u32>,
    disposition: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LegacyWrapper {
    csp_report: LegacyReport,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportingApiBody {
    #[serde(rename = "documentURL")]
    document_url: Option<String>,
    effective_directive: Option<String>,
    #[serde(rename = "blockedURL")]
    blocked_url: Option<String>,
    source_file: Option<String>,
    line_number: Option<u32>,
    column_number: Option<u32>,
    disposition: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReportingApiEntry {
    #[serde(rename = "type")]
    kind: String,
    body: Option<ReportingApiBody>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReportPayload {
    Legacy(LegacyWrapper),
    Batch(Vec<ReportingApiEntry>),
}

/// A violation in either wire format.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CspViolation {
    pub document_uri: Option<String>,
    pub effective_directive: Option<String>,
    pub blocked_uri: Option<String>,
    pub source_file: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
    pub disposition: Option<String>,
}

impl From<LegacyReport> for CspViolation {
    fn from(r: LegacyReport) -> Self {
        Self {
            document_uri: r.document_uri,
            effective_directive: r.effective_directive.or(r.violated_directive),
            blocked_uri: r.blocked_uri,
            source_file: r.source_file,
            line_number: r.line_number,
            column_number: r.column_number,
            disposition: r.disposition,
        }
    }
}

impl From<ReportingApiBody> for CspViolation {
    fn from(b: ReportingApiBody) -> Self {
        Self {
            document_uri: b.document_url,
            effective_directive: b.effective_directive,
            blocked_uri: b.blocked_url,
            source_file: b.source_file,
            line_number: b.line_number,
            column_number: b.column_number,
            disposition: b.disposition,
        }
    }
}

/// Parse a report body into violations. Non-CSP Reporting API entries are
/// dropped.
pub fn parse_reports(body: &[u8]) -> Result<Vec<CspViolation>, serde_json::Error> {
    Ok(match serde_json::from_slice::<ReportPayload>(body)? {
        ReportPayload::Legacy(wrapper) => vec![wrapper.csp_report.into()],
        ReportPayload::Batch(entries) => entries
            .into_iter()
            .filter(|entry| entry.kind == "csp-violation")
            .filter_map(|entry| entry.body)
            .map(CspViolation::from)
            .collect(),
    })
}

/// `POST /api/csp-report`
async fn csp_report(body: Bytes) -> StatusCode {
    let violations = match parse_reports(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed CSP report");
            return StatusCode::BAD_REQUEST;
        }
    };

    for v in &violations {
        tracing::warn!(
            document_uri = v.document_uri.as_deref().unwrap_or("-"),
            effective_directive = v.effective_directive.as_deref().unwrap_or("-"),
            blocked_uri = v.blocked_uri.as_deref().unwrap_or("-"),
            source_file = v.source_file.as_deref().unwrap_or("-"),
            line_number = v.line_number.unwrap_or(0),
            column_number = v.column_number.unwrap_or(0),
            disposition = v.disposition.as_deref().unwrap_or("-"),
            "CSP violation"
        );
    }

    StatusCode::NO_CONTENT
}
