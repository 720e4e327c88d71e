// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use csp_lifecycle::config::Config;
use csp_lifecycle::routes::create_router;
use csp_lifecycle::AppState;
use std::path::Path;
use std::sync::Arc;

/// Create a test app with the default test configuration.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

/// Create a test app with a caller-adjusted configuration.
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config));
    (create_router(state.clone()), state)
}

/// Write a small exported site into `dir`.
#[allow(dead_code)]
pub fn write_test_site(dir: &Path) {
    std::fs::write(
        dir.join("index.html"),
        r#"<!doctype html><html><head><script nonce="{{CSP_NONCE}}">window.dataLayer=[];</script></head><body>home</body></html>"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("pricing.html"),
        r#"<html><body>pricing<script nonce="{{CSP_NONCE}}" src="/app.js"></script></body></html>"#,
    )
    .unwrap();
    std::fs::create_dir_all(dir.join("legal")).unwrap();
    std::fs::write(dir.join("legal/index.html"), "<html><body>legal</body></html>").unwrap();
    std::fs::write(dir.join("app.js"), "console.log('app');").unwrap();
    std::fs::write(dir.join("robots.txt"), "User-agent: *\n").unwrap();
}
