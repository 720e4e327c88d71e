// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSP directive assembly and serialization.

use super::mode::Environment;

pub const DEFAULT_SRC: &str = "default-src";
pub const SCRIPT_SRC: &str = "script-src";
pub const STYLE_SRC: &str = "style-src";
pub const IMG_SRC: &str = "img-src";
pub const FONT_SRC: &str = "font-src";
pub const FRAME_SRC: &str = "frame-src";
pub const CONNECT_SRC: &str = "connect-src";
pub const MEDIA_SRC: &str = "media-src";
pub const OBJECT_SRC: &str = "object-src";
pub const BASE_URI: &str = "base-uri";
pub const FRAME_ANCESTORS: &str = "frame-ancestors";
pub const FORM_ACTION: &str = "form-action";
pub const UPGRADE_INSECURE_REQUESTS: &str = "upgrade-insecure-requests";
pub const REPORT_URI: &str = "report-uri";

const SELF: &str = "'self'";
const NONE: &str = "'none'";
const UNSAFE_INLINE: &str = "'unsafe-inline'";
const UNSAFE_EVAL: &str = "'unsafe-eval'";

/// Turnstile verification widget (script, frame and XHR).
pub const CHALLENGE_ORIGIN: &str = "https://challenges.cloudflare.com";

/// Consent-mode aware tag loader.
pub const TAG_MANAGER_ORIGIN: &str = "https://www.googletagmanager.com";

pub const FONTS_CSS_ORIGIN: &str = "https://fonts.googleapis.com";
pub const FONTS_HOST_ORIGIN: &str = "https://fonts.gstatic.com";

/// Embedded video players.
pub const VIDEO_ORIGINS: &[&str] = &[
    "https://www.youtube.com",
    "https://www.youtube-nocookie.com",
    "https://player.vimeo.com",
];

const SCRIPT_ORIGINS: &[&str] = &[CHALLENGE_ORIGIN, TAG_MANAGER_ORIGIN];

const IMAGE_ORIGINS: &[&str] = &[
    "https://images.unsplash.com",
    "https://i.ytimg.com",
    "https://i.vimeocdn.com",
    "https://www.google-analytics.com",
    TAG_MANAGER_ORIGIN,
];

const CONNECT_ORIGINS: &[&str] = &[
    CHALLENGE_ORIGIN,
    "https://www.google-analytics.com",
    "https://region1.google-analytics.com",
];

/// The product application that signup forms post to.
pub const APP_ORIGIN: &str = "https://app.shiftready.com";

/// Ordered directive map. `None` values are kept in place but omitted when
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspDirectives {
    entries: Vec<(&'static str, Option<Vec<String>>)>,
}

impl CspDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a directive, keeping its original position if already present.
    pub fn set(&mut self, name: &'static str, tokens: Option<Vec<String>>) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = tokens,
            None => self.entries.push((name, tokens)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, tokens)| tokens.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let idx = self.entries.iter().position(|(n, _)| *n == name)?;
        self.entries.remove(idx).1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&[String]>)> + '_ {
        self.entries
            .iter()
            .map(|(name, tokens)| (*name, tokens.as_deref()))
    }
}

/// Inputs to [`create_csp_directives`].
#[derive(Debug, Clone, Default)]
pub struct DirectiveOptions<'a> {
    pub nonce: &'a str,
    pub allow_unsafe_inline_scripts: bool,
    pub allow_unsafe_eval: bool,
    pub disable_upgrade_insecure_requests: bool,
    pub report_uri: Option<&'a str>,
    pub environment: Environment,
}

fn tokens(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn with_self(list: &[&str]) -> Vec<String> {
    std::iter::once(SELF)
        .chain(list.iter().copied())
        .map(String::from)
        .collect()
}

/// Assemble the directive set for one response.
pub fn create_csp_directives(options: &DirectiveOptions<'_>) -> CspDirectives {
    let dev = options.environment.is_development();

    let mut script_src = with_self(SCRIPT_ORIGINS);
    script_src.push(format!("'nonce-{}'", options.nonce));
    if options.allow_unsafe_inline_scripts || dev {
        script_src.push(UNSAFE_INLINE.to_string());
    }
    if options.allow_unsafe_eval || dev {
        script_src.push(UNSAFE_EVAL.to_string());
    }

    let mut img_src = with_self(&["data:", "blob:"]);
    img_src.extend(IMAGE_ORIGINS.iter().map(|s| s.to_string()));

    let mut frame_src = with_self(VIDEO_ORIGINS);
    frame_src.push(CHALLENGE_ORIGIN.to_string());

    let mut directives = CspDirectives::new();
    directives.set(DEFAULT_SRC, Some(tokens(&[SELF])));
    directives.set(SCRIPT_SRC, Some(script_src));
    directives.set(
        STYLE_SRC,
        Some(with_self(&[UNSAFE_INLINE, FONTS_CSS_ORIGIN])),
    );
    directives.set(IMG_SRC, Some(img_src));
    directives.set(FONT_SRC, Some(with_self(&["data:", FONTS_HOST_ORIGIN])));
    directives.set(FRAME_SRC, Some(frame_src));
    directives.set(CONNECT_SRC, Some(with_self(CONNECT_ORIGINS)));
    directives.set(MEDIA_SRC, Some(with_self(VIDEO_ORIGINS)));
    directives.set(OBJECT_SRC, Some(tokens(&[NONE])));
    directives.set(BASE_URI, Some(tokens(&[SELF])));
    directives.set(FRAME_ANCESTORS, Some(tokens(&[SELF])));
    directives.set(FORM_ACTION, Some(tokens(&[SELF, APP_ORIGIN])));
    directives.set(
        UPGRADE_INSECURE_REQUESTS,
        (!options.disable_upgrade_insecure_requests).then(|| vec![String::new()]),
    );
    directives.set(
        REPORT_URI,
        options
            .report_uri
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .map(|uri| vec![uri.to_string()]),
    );

    directives
}

/// Serialize directives in insertion order as `name tok tok; name tok`.
/// A directive whose tokens are all empty renders as its bare name.
pub fn serialize_csp_directives(directives: &CspDirectives) -> String {
    directives
        .iter()
        .filter_map(|(name, list)| {
            let values: Vec<&str> = list?
                .iter()
                .map(String::as_str)
                .filter(|t| !t.is_empty())
                .collect();
            if values.is_empty() {
                Some(name.to_string())
            } else {
                Some(format!("{} {}", name, values.join(" ")))
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
