// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end lifecycle stage → CSP mode tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use csp_lifecycle::config::Config;
use csp_lifecycle::csp::Environment;
use tower::ServiceExt;

mod common;

const CSP: &str = "content-security-policy";
const CSP_REPORT_ONLY: &str = "content-security-policy-report-only";

async fn get_with_headers(app: axum::Router, uri: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).map(|v| v.to_str().unwrap())
}

#[tokio::test]
async fn test_build_stage_is_report_only() {
    let (app, _) = common::create_test_app();
    let response = get_with_headers(app, "/health", &[("x-csp-lifecycle-stage", "build")]).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-csp-active-mode"), Some("report-only"));
    assert!(header(&response, CSP_REPORT_ONLY).is_some());
    assert!(header(&response, CSP).is_none());
}

#[tokio::test]
async fn test_pre_release_stage_is_dual() {
    let (app, _) = common::create_test_app();
    let response =
        get_with_headers(app, "/health", &[("x-csp-lifecycle-stage", "pre-release")]).await;

    assert_eq!(header(&response, "x-csp-active-mode"), Some("dual"));
    let enforcing = header(&response, CSP).unwrap();
    let report_only = header(&response, CSP_REPORT_ONLY).unwrap();
    assert!(enforcing.contains("upgrade-insecure-requests"));
    assert!(!report_only.contains("upgrade-insecure-requests"));
}

#[tokio::test]
async fn test_release_stage_is_enforce() {
    let (app, _) = common::create_test_app();
    let response = get_with_headers(app, "/health", &[("x-csp-lifecycle-stage", "release")]).await;

    assert_eq!(header(&response, "x-csp-active-mode"), Some("enforce"));
    assert!(header(&response, CSP).is_some());
    assert!(header(&response, CSP_REPORT_ONLY).is_none());
}

#[tokio::test]
async fn test_request_mode_override_beats_stage() {
    let (app, _) = common::create_test_app();
    let response = get_with_headers(
        app,
        "/health",
        &[
            ("x-csp-lifecycle-stage", "release"),
            ("x-csp-mode", "report-only"),
        ],
    )
    .await;

    assert_eq!(header(&response, "x-csp-active-mode"), Some("report-only"));
}

#[tokio::test]
async fn test_invalid_request_headers_fall_through() {
    let mut config = Config::test_default();
    config.csp.lifecycle_stage = Some("pre-release".to_string());
    let (app, _) = common::create_test_app_with_config(config);

    let response = get_with_headers(
        app,
        "/health",
        &[
            ("x-csp-lifecycle-stage", "production"),
            ("x-csp-mode", "block-everything"),
        ],
    )
    .await;

    assert_eq!(header(&response, "x-csp-active-mode"), Some("dual"));
}

#[tokio::test]
async fn test_production_defaults_to_release_with_hsts() {
    let mut config = Config::test_default();
    config.csp.environment = Environment::Production;
    let (app, _) = common::create_test_app_with_config(config);

    let response = get_with_headers(app, "/health", &[]).await;

    assert_eq!(header(&response, "x-csp-active-mode"), Some("enforce"));
    assert_eq!(
        header(&response, "strict-transport-security"),
        Some("max-age=63072000; includeSubDomains; preload")
    );
    let policy = header(&response, CSP).unwrap();
    assert!(!policy.contains("'unsafe-inline' 'unsafe-eval'"));
    assert!(!policy
        .split("; ")
        .find(|clause| clause.starts_with("script-src"))
        .unwrap()
        .contains("'unsafe-"));
}

#[tokio::test]
async fn test_each_request_gets_a_fresh_nonce() {
    let (app, _) = common::create_test_app();

    let first = get_with_headers(app.clone(), "/health", &[]).await;
    let second = get_with_headers(app, "/health", &[]).await;

    let a = header(&first, "x-nonce").unwrap();
    let b = header(&second, "x-nonce").unwrap();
    assert_ne!(a, b);
    assert!(a.len() >= 16);
    assert!(header(&first, CSP_REPORT_ONLY)
        .unwrap()
        .contains(&format!("'nonce-{a}'")));
}

#[tokio::test]
async fn test_report_uri_in_policy() {
    let (app, _) = common::create_test_app();
    let response = get_with_headers(app, "/health", &[]).await;

    assert!(header(&response, CSP_REPORT_ONLY)
        .unwrap()
        .ends_with("report-uri /api/csp-report"));
}

#[tokio::test]
async fn test_disabled_emits_nothing() {
    let mut config = Config::test_default();
    config.csp.disabled = true;
    let (app, _) = common::create_test_app_with_config(config);

    let response = get_with_headers(app, "/health", &[("accept", "text/html")]).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(header(&response, "x-nonce").is_none());
    assert!(header(&response, "x-csp-active-mode").is_none());
    assert!(header(&response, CSP).is_none());
    assert!(header(&response, CSP_REPORT_ONLY).is_none());
    assert!(header(&response, "x-frame-options").is_none());
}

#[tokio::test]
async fn test_api_routes_are_not_stamped() {
    let (app, _) = common::create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/csp-report")
                .header(header::CONTENT_TYPE, "application/csp-report")
                .body(Body::from(
                    r#"{"csp-report":{"document-uri":"https://example.com/","blocked-uri":"inline"}}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(header(&response, "x-csp-active-mode").is_none());
}
