//! Page counts from free-text extent strings ("320p ; 19cm", "320ページ").

use std::sync::LazyLock;

use regex::Regex;

/// Unit-tagged patterns, tried in order. Digits may be ASCII or full-width;
/// the `p` boundary is ASCII-only so "320pの" still counts as tagged.
static UNIT_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)([0-9０-９]+)\s*p(?-u:\b)").unwrap(),
        Regex::new(r"([0-9０-９]+)\s*ページ").unwrap(),
        Regex::new(r"([0-9０-９]+)\s*頁").unwrap(),
    ]
});

static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9０-９]+").unwrap());

/// Page count from an extent string, or 0 when none can be found.
///
/// A number tagged with a page unit wins over any bare number, so
/// `"2nd ed. 320p"` yields 320. Without a unit the first run of digits is
/// used.
pub fn parse_page_count(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    for pattern in UNIT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return number(&caps[1]);
        }
    }
    BARE_NUMBER.find(text).map(|m| number(m.as_str())).unwrap_or(0)
}

fn number(digits: &str) -> u32 {
    let ascii: String = digits
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            _ => c,
        })
        .collect();
    ascii.parse().unwrap_or(0)
}
