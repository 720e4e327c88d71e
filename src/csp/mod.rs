// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Content-Security-Policy building blocks.
//!
//! Everything here is evaluated per request and is pure apart from nonce
//! generation consuming entropy.

pub mod directives;
pub mod filter;
pub mod mode;
pub mod nonce;

pub use directives::{
    create_csp_directives, serialize_csp_directives, CspDirectives, DirectiveOptions,
};
pub use filter::should_handle_request;
pub use mode::{resolve_csp_mode, CspLifecycleStage, CspMode, Environment, ModeInputs};
pub use nonce::{create_nonce, EntropySource, Nonce, NonceGenerator, NonceSource};
