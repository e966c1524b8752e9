//! Session-mode-dependent quoting of raw text into statement literals.
//!
//! MySQL has two quoting regimes, selected by the server's SQL mode. In the
//! default mode backslash is the escape character; under
//! `NO_BACKSLASH_ESCAPES` a backslash is an ordinary character and a single
//! quote is escaped by doubling it.

/// Quoting regime for string literals, derived from the session's SQL mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuotingMode {
    /// Backslash is the escape character (default SQL mode).
    #[default]
    Standard,
    /// `NO_BACKSLASH_ESCAPES`: quotes are doubled, backslashes pass through
    /// untouched.
    NoBackslashEscapes,
}

/// Escape `raw` for the given mode and wrap it in single quotes.
///
/// The result is safe to embed directly into statement text. This is pure
/// text manipulation with no failure cases.
pub fn quote(raw: &str, mode: QuotingMode) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    match mode {
        QuotingMode::Standard => escape_into(raw, &mut out),
        QuotingMode::NoBackslashEscapes => {
            for ch in raw.chars() {
                if ch == '\'' {
                    out.push('\'');
                }
                out.push(ch);
            }
        }
    }
    out.push('\'');
    out
}

/// Backslash-escape `raw` without the surrounding quotes.
///
/// Only meaningful under [`QuotingMode::Standard`]; use [`quote`] for a
/// complete literal.
pub fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    escape_into(raw, &mut out);
    out
}

fn escape_into(raw: &str, out: &mut String) {
    for ch in raw.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
}
