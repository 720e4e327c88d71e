// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-request CSP nonce generation.
//!
//! Nonces come from an ordered chain of entropy sources. The first source
//! that produces a value wins, and the result is tagged with the source so
//! callers can notice when the secure tiers were unavailable.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Raw nonce length in bytes before encoding.
pub const NONCE_BYTES_LEN: usize = 16;

/// Which tier produced a nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonceSource {
    /// OS CSPRNG, base64-encoded.
    SystemRandom,
    /// Random v4 UUID without separators.
    Uuid,
    /// Non-cryptographic fallback.
    Degraded,
}

impl NonceSource {
    pub fn is_secure(&self) -> bool {
        !matches!(self, Self::Degraded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemRandom => "system-random",
            Self::Uuid => "uuid",
            Self::Degraded => "degraded",
        }
    }
}

impl fmt::Display for NonceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly generated nonce and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce {
    pub value: String,
    pub source: NonceSource,
}

impl Nonce {
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// One tier of the nonce fallback chain.
pub trait EntropySource: Send + Sync {
    /// Tag attached to nonces from this tier.
    fn source(&self) -> NonceSource;

    /// Produce a nonce, or `None` if this tier is unavailable.
    fn nonce(&self) -> Option<String>;
}

/// 16 bytes from the operating system's secure generator.
pub struct SystemRandomSource {
    rng: SystemRandom,
}

impl SystemRandomSource {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for SystemRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for SystemRandomSource {
    fn source(&self) -> NonceSource {
        NonceSource::SystemRandom
    }

    fn nonce(&self) -> Option<String> {
        let mut bytes = [0u8; NONCE_BYTES_LEN];
        self.rng.fill(&mut bytes).ok()?;
        Some(BASE64.encode(bytes))
    }
}

/// v4 UUID rendered as 32 hex characters.
///
/// The random bytes come from `ring` so an unavailable OS generator is an
/// error here rather than a panic inside `uuid`.
pub struct UuidSource {
    rng: SystemRandom,
}

impl UuidSource {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for UuidSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for UuidSource {
    fn source(&self) -> NonceSource {
        NonceSource::Uuid
    }

    fn nonce(&self) -> Option<String> {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes).ok()?;
        let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Some(id.simple().to_string())
    }
}

/// Bumped once per degraded half so two calls in the same clock tick differ.
static DEGRADED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Last resort: clock, counter and stack address mixed into base 36.
///
/// Touches no OS randomness. Never fails or panics.
pub struct DegradedSource;

impl DegradedSource {
    fn half(salt: u64) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let count = DEGRADED_COUNTER.fetch_add(1, Ordering::Relaxed);
        let marker = 0u8;
        let stack = std::ptr::addr_of!(marker) as usize as u64;

        let mut state = splitmix64(nanos as u64 ^ (nanos >> 64) as u64);
        state = splitmix64(state ^ count);
        state = splitmix64(state ^ stack);
        state = splitmix64(state ^ salt);
        format!("{:0>13}", to_base36(state))
    }
}

impl EntropySource for DegradedSource {
    fn source(&self) -> NonceSource {
        NonceSource::Degraded
    }

    fn nonce(&self) -> Option<String> {
        Some(format!("{}{}", Self::half(0), Self::half(1)))
    }
}

/// SplitMix64 finalizer. Deterministic for a given input.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(13);
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Ordered fallback chain of entropy sources.
pub struct NonceGenerator {
    tiers: Vec<Box<dyn EntropySource>>,
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::with_tiers(vec![
            Box::new(SystemRandomSource::new()),
            Box::new(UuidSource::new()),
            Box::new(DegradedSource),
        ])
    }
}

impl NonceGenerator {
    pub fn with_tiers(tiers: Vec<Box<dyn EntropySource>>) -> Self {
        Self { tiers }
    }

    /// Generate a nonce from the first tier that succeeds.
    pub fn generate(&self) -> Nonce {
        for tier in &self.tiers {
            let source = tier.source();
            match tier.nonce() {
                Some(value) => {
                    if source != NonceSource::SystemRandom {
                        tracing::warn!(
                            source = %source,
                            "CSP nonce generated from fallback source"
                        );
                    }
                    return Nonce { value, source };
                }
                None => tracing::warn!(source = %source, "CSP nonce source unavailable"),
            }
        }

        tracing::warn!("All configured CSP nonce sources failed; using degraded source");
        Nonce {
            value: DegradedSource.nonce().unwrap_or_default(),
            source: NonceSource::Degraded,
        }
    }
}

/// Generate a nonce value from the default chain.
pub fn create_nonce() -> String {
    NonceGenerator::default().generate().value
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unavailable(NonceSource);

    impl EntropySource for Unavailable {
        fn source(&self) -> NonceSource {
            self.0
        }

        fn nonce(&self) -> Option<String> {
            None
        }
    }

    fn is_nonce_charset(s: &str) -> bool {
        s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
    }

    #[test]
    fn test_create_nonce_format() {
        let nonce = create_nonce();
        assert!(nonce.len() >= 16);
        assert!(is_nonce_charset(&nonce), "unexpected characters in {nonce}");

        let decoded = BASE64.decode(&nonce).expect("valid base64");
        assert_eq!(decoded.len(), NONCE_BYTES_LEN);
    }

    #[test]
    fn test_nonces_are_unique() {
        let generator = NonceGenerator::default();
        let a = generator.generate();
        let b = generator.generate();
        assert_eq!(a.source, NonceSource::SystemRandom);
        assert_ne!(a.value, b.value);
    }

    #[test]
    fn test_falls_back_to_uuid() {
        let generator = NonceGenerator::with_tiers(vec![
            Box::new(Unavailable(NonceSource::SystemRandom)),
            Box::new(UuidSource::new()),
            Box::new(DegradedSource),
        ]);
        let nonce = generator.generate();
        assert_eq!(nonce.source, NonceSource::Uuid);
        assert!(nonce.source.is_secure());
        assert_eq!(nonce.value.len(), 32);
        assert!(!nonce.value.contains('-'));
        assert!(is_nonce_charset(&nonce.value));
    }

    #[test]
    fn test_falls_back_to_degraded() {
        let generator = NonceGenerator::with_tiers(vec![
            Box::new(Unavailable(NonceSource::SystemRandom)),
            Box::new(Unavailable(NonceSource::Uuid)),
            Box::new(DegradedSource),
        ]);
        let nonce = generator.generate();
        assert_eq!(nonce.source, NonceSource::Degraded);
        assert!(!nonce.source.is_secure());
        assert!(nonce.value.len() >= 16);
        assert!(is_nonce_charset(&nonce.value));
    }

    #[test]
    fn test_empty_chain_still_yields_nonce() {
        let nonce = NonceGenerator::with_tiers(Vec::new()).generate();
        assert_eq!(nonce.source, NonceSource::Degraded);
        assert_eq!(nonce.value.len(), 26);
    }

    #[test]
    fn test_uuid_tier_is_version_4() {
        let value = UuidSource::new().nonce().unwrap();
        let id = uuid::Uuid::parse_str(&value).unwrap();
        assert_eq!(id.get_version_num(), 4);
        assert_eq!(id.simple().to_string(), value);
    }

    #[test]
    fn test_degraded_nonces_are_distinct() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..250)
                        .map(|_| DegradedSource.nonce().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = std::collections::HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert_eq!(value.len(), 26);
                assert!(value.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
                assert!(seen.insert(value), "duplicate degraded nonce");
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_splitmix64_is_deterministic() {
        // Reference SplitMix64 stream seeded with 0.
        assert_eq!(splitmix64(0), 0xe220_a839_7b1d_cdaf);
        assert_eq!(splitmix64(0x9e37_79b9_7f4a_7c15), 0x6e78_9e6a_a1b9_65f4);
        assert_ne!(splitmix64(1), splitmix64(0));
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u64::MAX), "3w5e11264sgsf");
    }
}
