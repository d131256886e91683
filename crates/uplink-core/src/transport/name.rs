//! Remote filename sanitization.

/// Fallback when sanitization leaves nothing usable.
pub const DEFAULT_REMOTE_NAME: &str = "upload.bin";

/// Sanitizes a candidate remote filename.
///
/// - Trims surrounding whitespace; empty input falls back to the default
/// - Replaces `/`, `\`, and `:` with `_`
/// - Strips leading `.` so the upload never becomes a hidden file
/// - Empty after stripping falls back to the default
pub fn sanitize_remote_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return DEFAULT_REMOTE_NAME.to_string();
    }

    let replaced: String = trimmed
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
        .collect();

    let stripped = replaced.trim_start_matches('.');
    if stripped.is_empty() {
        DEFAULT_REMOTE_NAME.to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_path_separators() {
        assert_eq!(sanitize_remote_name("a/b\\c:d.mov"), "a_b_c_d.mov");
    }

    #[test]
    fn strips_leading_dots() {
        assert_eq!(sanitize_remote_name(".hidden.mov"), "hidden.mov");
        assert_eq!(sanitize_remote_name("...x"), "x");
    }

    #[test]
    fn empty_and_dot_only_fall_back() {
        assert_eq!(sanitize_remote_name(""), DEFAULT_REMOTE_NAME);
        assert_eq!(sanitize_remote_name("   "), DEFAULT_REMOTE_NAME);
        assert_eq!(sanitize_remote_name("..."), DEFAULT_REMOTE_NAME);
    }

    #[test]
    fn ordinary_names_pass_through() {
        assert_eq!(sanitize_remote_name("cut_v2.mp4"), "cut_v2.mp4");
    }
}
