// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Site serving: nonce-stamped HTML documents and static assets.

use crate::csp::filter::last_segment_extension;
use crate::error::{AppError, Result};
use crate::middleware::CspNonce;
use crate::AppState;
use axum::{
    extract::{Request, State},
    response::{Html, IntoResponse, Response},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Replaced with the request nonce in every HTML template.
pub const NONCE_PLACEHOLDER: &str = "{{CSP_NONCE}}";

/// Candidate template files for a document route, most specific first.
///
/// `/` maps to `index.html`; `/pricing` to `pricing.html` then
/// `pricing/index.html`; `/about.html` to itself. Traversal segments are
/// rejected.
pub fn page_candidates(site_dir: &Path, path: &str) -> Result<Vec<PathBuf>> {
    let mut relative = PathBuf::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." || segment.contains('\\') || segment.contains(':') {
            return Err(AppError::BadRequest(format!("invalid path: {path}")));
        }
        relative.push(segment);
    }

    if relative.as_os_str().is_empty() {
        return Ok(vec![site_dir.join("index.html")]);
    }

    let base = site_dir.join(&relative);
    if relative.extension().is_some_and(|ext| ext == "html") {
        return Ok(vec![base]);
    }
    let mut candidates = Vec::with_capacity(2);
    if !path.ends_with('/') {
        candidates.push(base.with_extension("html"));
    }
    candidates.push(base.join("index.html"));
    Ok(candidates)
}

/// Stamp the nonce into a template.
pub fn render_document(template: &str, nonce: &str) -> String {
    template.replace(NONCE_PLACEHOLDER, nonce)
}

async fn load_page(candidates: &[PathBuf]) -> Result<Option<String>> {
    for candidate in candidates {
        match tokio::fs::read_to_string(candidate).await {
            Ok(template) => return Ok(Some(template)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(AppError::Internal(anyhow::Error::new(e).context(format!(
                    "failed to read template {}",
                    candidate.display()
                ))))
            }
        }
    }
    Ok(None)
}

/// Fallback handler: documents for extensionless and `.html` paths, files
/// otherwise.
pub async fn serve_site(
    State(state): State<Arc<AppState>>,
    nonce: CspNonce,
    request: Request,
) -> Result<Response> {
    let path = request.uri().path().to_string();

    let is_asset =
        last_segment_extension(&path).is_some_and(|ext| !ext.eq_ignore_ascii_case("html"));
    if is_asset {
        let response = match ServeDir::new(&state.config.site_dir).oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        return Ok(response.into_response());
    }

    let candidates = page_candidates(&state.config.site_dir, &path)?;
    let template = load_page(&candidates)
        .await?
        .ok_or_else(|| AppError::NotFound(path.clone()))?;

    if nonce.value().is_empty() && template.contains(NONCE_PLACEHOLDER) {
        tracing::warn!(path = %path, "Rendering document without a CSP nonce");
    }

    Ok(Html(render_document(&template, nonce.value())).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_candidates() {
        let dir = Path::new("/srv/site");
        assert_eq!(
            page_candidates(dir, "/").unwrap(),
            vec![PathBuf::from("/srv/site/index.html")]
        );
        assert_eq!(
            page_candidates(dir, "/pricing").unwrap(),
            vec![
                PathBuf::from("/srv/site/pricing.html"),
                PathBuf::from("/srv/site/pricing/index.html"),
            ]
        );
        assert_eq!(
            page_candidates(dir, "/about.html").unwrap(),
            vec![PathBuf::from("/srv/site/about.html")]
        );
        assert_eq!(
            page_candidates(dir, "/legal/privacy/").unwrap(),
            vec![PathBuf::from("/srv/site/legal/privacy/index.html")]
        );
    }

    #[test]
    fn test_page_candidates_reject_traversal() {
        let dir = Path::new("/srv/site");
        assert!(matches!(
            page_candidates(dir, "/../etc/passwd"),
            Err(AppError::BadRequest(_))
        ));
        assert!(page_candidates(dir, "/a/./b").is_err());
        assert!(page_candidates(dir, "/a\\..\\b").is_err());
    }

    #[test]
    fn test_render_document_replaces_every_placeholder() {
        let template = r#"<script nonce="{{CSP_NONCE}}">a()</script><script nonce="{{CSP_NONCE}}" src="/b.js"></script>"#;
        let rendered = render_document(template, "abc123==");
        assert_eq!(
            rendered,
            r#"<script nonce="abc123==">a()</script><script nonce="abc123==" src="/b.js"></script>"#
        );
    }
}
