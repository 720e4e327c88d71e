// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSP and security headers middleware.

use crate::csp::{resolve_csp_mode, should_handle_request, CspLifecycleStage, ModeInputs};
use crate::headers::{build_security_headers, HeaderOptions};
use crate::middleware::nonce::CspNonce;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Nonce passthrough header, set on both the forwarded request and the response.
pub const X_NONCE: &str = "x-nonce";
/// Resolved mode, for debugging and test assertions.
pub const X_CSP_ACTIVE_MODE: &str = "x-csp-active-mode";
/// Request header naming the lifecycle stage.
pub const X_CSP_LIFECYCLE_STAGE: &str = "x-csp-lifecycle-stage";
/// Request header overriding the mode.
pub const X_CSP_MODE: &str = "x-csp-mode";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

/// Add CSP and hardening headers to HTML document responses.
///
/// A fresh nonce is generated per request and forwarded to the inner
/// service as `x-nonce` so the document renderer can stamp inline scripts.
pub async fn apply_security_headers(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let csp = &state.config.csp;

    let handled = should_handle_request(
        csp,
        request.uri().path(),
        header_str(request.headers(), header::ACCEPT.as_str()),
    );
    if !handled {
        return next.run(request).await;
    }

    let nonce = state.nonce_generator.generate();
    let stage = header_str(request.headers(), X_CSP_LIFECYCLE_STAGE)
        .and_then(CspLifecycleStage::parse)
        .unwrap_or_else(|| csp.default_stage());
    let mode = resolve_csp_mode(&ModeInputs {
        env_mode: csp.env_mode.as_deref(),
        lifecycle_stage: Some(stage.as_str()),
        request_override_mode: header_str(request.headers(), X_CSP_MODE),
    });

    tracing::debug!(
        path = %request.uri().path(),
        mode = %mode,
        stage = %stage,
        nonce_source = %nonce.source,
        "Applying CSP headers"
    );

    let security_headers =
        build_security_headers(&HeaderOptions::from_config(csp, nonce.as_str(), mode));

    let nonce_value = match HeaderValue::from_str(nonce.as_str()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(error = %e, "CSP nonce is not a valid header value");
            None
        }
    };

    // Replace anything the client sent so the renderer only sees our nonce.
    request.headers_mut().remove(X_NONCE);
    if let Some(value) = &nonce_value {
        request.headers_mut().insert(X_NONCE, value.clone());
    }
    request.extensions_mut().insert(CspNonce(nonce.as_str().to_owned()));

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for security_header in security_headers.iter() {
        match HeaderValue::from_str(&security_header.value) {
            Ok(value) => {
                headers.insert(security_header.key, value);
            }
            Err(e) => {
                tracing::error!(
                    header = security_header.key,
                    error = %e,
                    "Skipping security header with invalid value"
                );
            }
        }
    }
    if let Some(value) = nonce_value {
        headers.insert(X_NONCE, value);
    }
    headers.insert(X_CSP_ACTIVE_MODE, HeaderValue::from_static(mode.as_str()));

    response
}
