//! Secret redaction
//!
//! Replaces API tokens with `REDACTED` before text is forwarded to the
//! telemetry backend or echoed back to the terminal. Two forms are covered:
//! - an `Authorization`-style `Token <value>` pair
//! - the `-t` / `--token` command-line flag and its value, in any of the
//!   `--token=v`, `--token v`, `--token="v"`, `-t v`, `-t,v` or `-tv`
//!   spellings, wherever the flag appears (after quotes, brackets, `=`...)
//!
//! Redaction is idempotent: `REDACTED` is itself token-shaped, so a second
//! pass rewrites it to the same text.

use std::sync::LazyLock;

use regex::Regex;

const REDACTED: &str = "REDACTED";

/// `Token <value>` with any run of whitespace between the two
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Token\s+([\w-]+)").expect("valid token pattern"));

/// Token flag with optional `=`/`,`/whitespace separator and optional quotes.
/// The flag must not follow a word character or hyphen, so hyphenated words
/// such as `service-type` are left alone.
static TOKEN_FLAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[^\w-])(-t|--token)(\s*[=,]?\s*['"]?)([\w-]+)(['"]?)"#)
        .expect("valid token flag pattern")
});

/// Redact API tokens in `input`.
///
/// Text without a match is returned unchanged.
pub fn redact(input: &str) -> String {
    let filtered = TOKEN_PATTERN.replace_all(input, format!("Token {REDACTED}"));
    TOKEN_FLAG_PATTERN
        .replace_all(&filtered, format!("${{1}}${{2}}${{3}}{REDACTED}${{5}}"))
        .into_owned()
}

/// Check if text contains something [`redact`] would rewrite.
pub fn contains_secret(input: &str) -> bool {
    redact(input) != input
}
