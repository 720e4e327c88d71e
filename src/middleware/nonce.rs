// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request-side access to the per-request CSP nonce.

use super::security::X_NONCE;
use axum::{extract::FromRequestParts, http::request::Parts};

/// The nonce the security middleware put on this request.
///
/// Looked up in request extensions first, then in the forwarded `x-nonce`
/// header. Never rejects; a missing nonce yields an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspNonce(pub String);

impl CspNonce {
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(nonce) = parts.extensions.get::<Self>() {
            return Ok(nonce.clone());
        }
        if let Some(nonce) = parts.headers.get(X_NONCE).and_then(|h| h.to_str().ok()) {
            return Ok(Self(nonce.to_string()));
        }
        tracing::warn!("CSP nonce not found on request - security middleware may be missing");
        Ok(Self(String::new()))
    }
}
