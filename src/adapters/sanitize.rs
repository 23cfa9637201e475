//! Log sanitization for PII and secret filtering.
//!
//! Identity flows handle exactly the data that must never reach log
//! files: mobile numbers, email addresses, one-time codes, session
//! tokens, and password hashes. The primary protection is keeping those
//! values out of logging calls; this writer is the defense-in-depth
//! fallback that redacts anything that slips through formatted output.
//!
//! # Performance / DoS
//!
//! Scanning and allocating on large inputs is expensive even with a
//! linear-time regex engine, so `sanitize()` caps input size (see
//! `RAPIDCARE_SANITIZE_MAX_BYTES`).

use regex::Regex;
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

/// Compiled redaction patterns.
static PII_PATTERNS: OnceLock<Vec<PiiPattern>> = OnceLock::new();

/// Maximum number of bytes to sanitize per call.
///
/// Defaults to 16 KiB; can be overridden via `RAPIDCARE_SANITIZE_MAX_BYTES`.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct PiiPattern {
    regex: Regex,
    replacement: &'static str,
}

fn max_sanitize_bytes() -> usize {
    std::env::var("RAPIDCARE_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Initialize redaction patterns (compiled once).
fn get_patterns() -> &'static Vec<PiiPattern> {
    PII_PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Email addresses (bounded labels; case-insensitive)
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            // Argon2 PHC strings
            (r"\$argon2[a-z0-9]*\$[^\s]+", "[REDACTED-HASH]"),
            // Session tokens (64 hex chars)
            (r"\b[0-9a-fA-F]{64}\b", "[REDACTED-TOKEN]"),
            // Contextual one-time codes: only when labeled, to avoid
            // eating every 6-digit number
            (r"(?i)\botp\b\s*[:=]?\s*\d{6}\b", "[REDACTED-OTP]"),
            // Mobile numbers (10+ consecutive digits, optional country code)
            (r"\b(?:\+?91[-\s]?)?\d{10}\b", "[REDACTED-MOBILE]"),
            // Contextual secrets
            (
                r"(?i)\b(?:password|passwd|pwd|secret|token)\b\s*[:=]\s*\S{8,}",
                "[REDACTED-SECRET]",
            ),
        ];

        rules
            .into_iter()
            .map(|(pattern, replacement)| PiiPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect()
    })
}

/// Sanitize a string by replacing PII patterns.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for pattern in get_patterns() {
        if pattern.regex.is_match(&result) {
            result = pattern
                .regex
                .replace_all(&result, pattern.replacement)
                .to_string();
        }
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check if a string contains potential PII.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (prefix, _truncated) = truncate_to_char_boundary(input, max_sanitize_bytes());
    get_patterns().iter().any(|p| p.regex.is_match(prefix))
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log
/// output before it reaches the underlying sink.
///
/// Keeps sanitization centralized instead of requiring `sanitize()` at
/// every callsite.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let line_str = String::from_utf8_lossy(&line);
            let sanitized = sanitize(&line_str);
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // Prevent unbounded buffering if the formatter writes a huge
        // line with no newlines.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if hard_cap > 0 && self.buffer.len() > hard_cap {
            let s = String::from_utf8_lossy(&self.buffer).to_string();
            let sanitized = sanitize(&s);
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n[TRUNCATED]\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let s = String::from_utf8_lossy(&self.buffer);
            let sanitized = sanitize(&s);
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_email() {
        let sanitized = sanitize("Recovery started for asha@hospital.org");
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
        assert!(!sanitized.contains("asha@"));
    }

    #[test]
    fn test_sanitize_mobile() {
        let sanitized = sanitize("Lookup by mobile 9876543210 failed");
        assert!(sanitized.contains("[REDACTED-MOBILE]"));
        assert!(!sanitized.contains("9876543210"));
    }

    #[test]
    fn test_sanitize_otp_code() {
        let sanitized = sanitize("otp=042519 stored");
        assert!(sanitized.contains("[REDACTED-OTP]"));
        assert!(!sanitized.contains("042519"));
    }

    #[test]
    fn test_sanitize_session_token() {
        let token = "a".repeat(64);
        let sanitized = sanitize(&format!("authenticated {token}"));
        assert!(sanitized.contains("[REDACTED-TOKEN]"));
    }

    #[test]
    fn test_sanitize_phc_hash() {
        let sanitized =
            sanitize("stored $argon2id$v=19$m=47104,t=1,p=1$c29tZXNhbHQ$hashhashhash");
        assert!(sanitized.contains("[REDACTED-HASH]"));
        assert!(!sanitized.contains("c29tZXNhbHQ"));
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(sanitize("Purged 3 expired sessions"), "Purged 3 expired sessions");
        assert!(!contains_pii("Purged 3 expired sessions"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let sanitized = sanitize_with_limit("prefix 9876543210 suffix", 18);
        assert!(sanitized.contains("[TRUNCATED]"));
    }
}
