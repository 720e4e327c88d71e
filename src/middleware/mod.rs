// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (CSP nonce and security headers).

pub mod nonce;
pub mod security;

pub use nonce::CspNonce;
pub use security::apply_security_headers;
