//! Resolved book metadata.

use serde::{Deserialize, Serialize};

use crate::isbn::CanonicalIsbn;

/// One book as resolved from a single metadata source.
///
/// Every text field defaults to the empty string and `total_pages` to 0 when
/// the source does not carry it. `current_page` and `reading_time` belong to
/// the reader, not the source, and start at 0.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub isbn: CanonicalIsbn,
    pub title: String,
    pub author: String,
    pub publisher: String,
    /// Source-specific format, e.g. `2020-07` or `20200701`.
    pub pubdate: String,
    pub total_pages: u32,
    pub cover_image: String,
    pub current_page: u32,
    pub reading_time: u64,
}

impl BookRecord {
    /// Fresh record for `isbn` with every other field empty.
    pub fn new(isbn: CanonicalIsbn) -> Self {
        Self {
            isbn,
            ..Default::default()
        }
    }
}
