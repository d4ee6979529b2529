//! Filesystem-safe filename sanitization.

/// Longest filename most filesystems accept (Linux NAME_MAX, in bytes).
const NAME_MAX: usize = 255;

/// Sanitizes a derived filename so it can be joined onto the destination dir.
///
/// - Percent-escapes are left alone; the listing service already encodes them
/// - Path separators, NUL, control chars and `: * ? " < > |` become `_`
/// - Leading/trailing spaces and dots are trimmed (no `..` traversal)
/// - Truncated to 255 bytes on a char boundary
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');

    if trimmed.len() <= NAME_MAX {
        return trimmed.to_string();
    }
    let mut take = NAME_MAX;
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}
