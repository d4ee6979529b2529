//! Hyperlink extraction from a listing page.
//!
//! Pure pattern matching over the document text; there is no HTML parser, so
//! malformed markup never fails, it just yields fewer (or noisier) links.

use regex::Regex;
use std::sync::OnceLock;

static RE_HREF: OnceLock<Regex> = OnceLock::new();

fn re_href() -> &'static Regex {
    RE_HREF.get_or_init(|| Regex::new(r#"href=['"]?([^'" >]+)"#).expect("compile RE_HREF"))
}

/// Lazily yields every `href` attribute value in `html`, in document order.
///
/// Values may be single-quoted, double-quoted or unquoted and end at a quote,
/// a space or `>`. Duplicates and non-file links are kept; filtering happens
/// in the planner.
pub fn extract_links(html: &str) -> impl Iterator<Item = &str> + '_ {
    re_href()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}
