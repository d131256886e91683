//! Hostname normalization and validation.
//!
//! Users paste hostnames from everywhere: full URLs, trailing dots from DNS
//! tooling, invisible code points from rich-text fields. Normalize before
//! resolving, and reject anything that still is not a plain DNS name.

use url::Url;

use crate::error::TransferError;

/// Normalizes a host string to a bare lowercase DNS name.
///
/// - A parseable URL is reduced to its host part (`HTTPS://Example.COM:443/x`
///   becomes `example.com`)
/// - Whitespace and invisible/format code points are dropped
/// - Trailing dots are stripped (`example.com.` becomes `example.com`)
/// - Anything left outside `[a-z0-9.-]` is an error naming the offenders
pub fn normalize_host(input: &str) -> Result<String, TransferError> {
    let trimmed = input.trim();

    let raw = match Url::parse(trimmed) {
        Ok(u) if u.has_host() => u.host_str().unwrap_or_default().to_string(),
        _ => trimmed.to_string(),
    };

    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_whitespace() || is_invisible(c) {
            continue;
        }
        for lower in c.to_lowercase() {
            cleaned.push(lower);
        }
    }
    while cleaned.ends_with('.') {
        cleaned.pop();
    }

    if cleaned.is_empty() {
        return Err(TransferError::InvalidHost("empty host".to_string()));
    }

    let offending: Vec<char> = cleaned
        .chars()
        .filter(|c| !matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
        .collect();
    if !offending.is_empty() {
        let list = offending
            .iter()
            .map(|c| format!("{:?} (U+{:04X})", c, *c as u32))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(TransferError::InvalidHost(format!(
            "unsupported characters: {}",
            list
        )));
    }

    Ok(cleaned)
}

/// Zero-width and soft-hyphen style code points that survive a copy-paste.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{2060}' | '\u{FEFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_input_reduces_to_host() {
        assert_eq!(
            normalize_host("HTTPS://Example.COM:443/x").unwrap(),
            "example.com"
        );
        assert_eq!(
            normalize_host("http://files.example.org/path?q=1#frag").unwrap(),
            "files.example.org"
        );
    }

    #[test]
    fn trailing_dots_are_stripped() {
        assert_eq!(normalize_host("example.com.").unwrap(), "example.com");
        assert_eq!(normalize_host("example.com..").unwrap(), "example.com");
    }

    #[test]
    fn case_folds_and_drops_invisibles() {
        assert_eq!(normalize_host("  Example.COM ").unwrap(), "example.com");
        assert_eq!(
            normalize_host("exam\u{200B}ple.com").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn non_ascii_letter_rejected_with_code_point() {
        let err = normalize_host("ex\u{00E4}mple.com").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("U+00E4"), "missing code point in: {}", msg);
    }

    #[test]
    fn empty_input_rejected() {
        assert!(normalize_host("   ").is_err());
        assert!(normalize_host("...").is_err());
    }
}
