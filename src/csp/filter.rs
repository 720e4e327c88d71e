// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decide which requests are HTML navigations that get CSP headers.

use crate::config::CspConfig;

/// Framework-internal asset mounts.
const INTERNAL_PREFIXES: &[&str] = &["/_next", "/_app"];

const API_PREFIX: &str = "/api";

/// Well-known non-document paths.
const EXCLUDED_PATHS: &[&str] = &["/favicon.ico", "/robots.txt", "/sitemap.xml"];
const EXCLUDED_PREFIXES: &[&str] = &["/fonts/"];

const STATIC_EXTENSIONS: &[&str] = &[
    "js", "mjs", "cjs", "css", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif", "woff",
    "woff2", "ttf", "otf", "eot", "pdf", "json", "map", "txt", "xml", "webmanifest",
];

/// Returns true if the request should receive CSP and hardening headers.
pub fn should_handle_request(config: &CspConfig, path: &str, accept: Option<&str>) -> bool {
    if config.disabled {
        return false;
    }
    if INTERNAL_PREFIXES.iter().any(|p| has_segment_prefix(path, p)) {
        return false;
    }
    if has_segment_prefix(path, API_PREFIX) {
        return false;
    }
    if EXCLUDED_PATHS.contains(&path) || EXCLUDED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return false;
    }

    let extension = last_segment_extension(path);
    if let Some(ext) = extension {
        if STATIC_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
        {
            return false;
        }
    }

    if accept.is_some_and(|a| a.contains("text/html")) {
        return true;
    }

    // Extensionless paths are assumed to be document routes.
    extension.is_none()
}

/// `/api` matches `/api` and `/api/...` but not `/apiary`.
fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub(crate) fn last_segment_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}
