//! ISBN canonicalization.
//!
//! A canonical key is the raw input uppercased with everything except ASCII
//! digits and `X` removed. No checksum or length validation happens here;
//! lookups against a malformed key simply find nothing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shortest canonical key the HTTP layer accepts (ISBN-10).
pub const MIN_ISBN_LEN: usize = 10;

/// Digits and uppercase `X` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalIsbn(String);

impl CanonicalIsbn {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn meets_min_length(&self) -> bool {
        self.len() >= MIN_ISBN_LEN
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalIsbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalIsbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalize a raw ISBN string. Never fails; the result may be empty.
pub fn normalize(raw: &str) -> CanonicalIsbn {
    let key = raw
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X')
        .collect();
    CanonicalIsbn(key)
}
