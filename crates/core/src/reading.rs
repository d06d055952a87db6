//! Reading-progress records kept per book.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::BookRecord;

/// A book on the reader's shelf with their progress through it.
///
/// Fields the client sends beyond the known ones are kept in `extra` and
/// written back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadingRecord {
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub pubdate: String,
    pub total_pages: u32,
    pub current_page: u32,
    pub cover_image: String,
    /// Accumulated reading time in seconds.
    pub reading_time: u64,
    #[serde(rename = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadingPatch {
    pub id: Option<String>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub pubdate: Option<String>,
    pub total_pages: Option<u32>,
    pub current_page: Option<u32>,
    pub cover_image: Option<String>,
    pub reading_time: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReadingRecord {
    pub fn from_book(book: BookRecord) -> Self {
        Self {
            isbn: book.isbn.into_string(),
            title: book.title,
            author: book.author,
            publisher: book.publisher,
            pubdate: book.pubdate,
            total_pages: book.total_pages,
            current_page: book.current_page,
            cover_image: book.cover_image,
            reading_time: book.reading_time,
            ..Default::default()
        }
    }

    /// Percentage read, 0.0 when the page count is unknown.
    pub fn progress_percentage(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        f64::from(self.current_page) / f64::from(self.total_pages) * 100.0
    }

    pub fn is_completed(&self) -> bool {
        self.current_page >= self.total_pages
    }

    /// Set the current page, capped at the page count when it is known.
    pub fn update_progress(&mut self, current_page: u32) {
        self.current_page = if self.total_pages > 0 {
            current_page.min(self.total_pages)
        } else {
            current_page
        };
        self.touch();
    }

    pub fn update_reading_time(&mut self, seconds: u64) {
        self.reading_time = seconds;
        self.touch();
    }

    /// Shallow merge of `patch` into this record. The id never changes.
    pub fn apply(&mut self, patch: ReadingPatch) {
        if let Some(v) = patch.isbn {
            self.isbn = v;
        }
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.author {
            self.author = v;
        }
        if let Some(v) = patch.publisher {
            self.publisher = v;
        }
        if let Some(v) = patch.pubdate {
            self.pubdate = v;
        }
        if let Some(v) = patch.total_pages {
            self.total_pages = v;
        }
        if let Some(v) = patch.cover_image {
            self.cover_image = v;
        }
        if let Some(v) = patch.reading_time {
            self.reading_time = v;
        }
        for (k, v) in patch.extra {
            if k != "created_at" && k != "updated_at" {
                self.extra.insert(k, v);
            }
        }
        match patch.current_page {
            Some(page) => self.update_progress(page),
            None => self.touch(),
        }
    }

    /// Stamp creation and update times on a record about to be stored.
    pub fn stamp_created(&mut self) {
        let now = now_rfc3339();
        self.created_at = Some(now.clone());
        self.updated_at = Some(now);
    }

    fn touch(&mut self) {
        self.updated_at = Some(now_rfc3339());
    }
}

impl From<ReadingPatch> for ReadingRecord {
    fn from(patch: ReadingPatch) -> Self {
        let mut record = ReadingRecord {
            id: patch.id.clone().unwrap_or_default(),
            ..Default::default()
        };
        record.apply(patch);
        record
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
