//! Filename hints taken from URL structure.

/// Returns the last non-empty path segment of `url` (query and fragment excluded).
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Returns the `index`-th piece (0-based) of `raw` split on `'/'` after dropping
/// its last `strip_chars` characters, plus the number of pieces found.
///
/// The split counts the scheme (`https:`) and the empty piece between `//`, so
/// for `https://host/a/b` piece 3 is `a`.
pub fn positional_piece(raw: &str, strip_chars: usize, index: usize) -> (Option<&str>, usize) {
    let keep = raw.chars().count().saturating_sub(strip_chars);
    let end = raw
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    let head = &raw[..end];
    let found = head.split('/').count();
    (head.split('/').nth(index), found)
}
