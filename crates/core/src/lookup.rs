//! Book metadata lookup by ISBN over pluggable sources (openBD, NDL Search).
//!
//! [`MetadataResolver`] probes its sources strictly in order and stops at the
//! first one that produces a record. A source that fails (network, timeout,
//! bad status, unparsable payload) is logged and treated exactly like a
//! source that found nothing.

pub mod extent;
pub mod ndl;
pub mod openbd;

use std::time::Duration;

use crate::config::{LookupConfig, SourceKind};
use crate::error::LookupError;
use crate::isbn::CanonicalIsbn;
use crate::record::BookRecord;

use self::ndl::NdlProvider;
use self::openbd::OpenBdProvider;

pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the source answered and has no such book.
    fn lookup_isbn(&self, isbn: &CanonicalIsbn) -> Result<Option<BookRecord>, LookupError>;
}

/// Ordered list of sources; the first hit wins, fields are never merged.
pub struct MetadataResolver {
    sources: Vec<Box<dyn MetadataSource>>,
}

impl MetadataResolver {
    pub fn new(sources: Vec<Box<dyn MetadataSource>>) -> Self {
        Self { sources }
    }

    /// Build the configured sources, each with its own HTTP client.
    pub fn from_config(config: &LookupConfig) -> Result<Self, LookupError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut sources: Vec<Box<dyn MetadataSource>> = Vec::with_capacity(config.sources.len());
        for kind in &config.sources {
            let source: Box<dyn MetadataSource> = match kind {
                SourceKind::Openbd => Box::new(OpenBdProvider::new(&config.openbd_endpoint, timeout)?),
                SourceKind::Ndl => Box::new(NdlProvider::new(&config.ndl_endpoint, timeout)?),
            };
            sources.push(source);
        }
        Ok(Self::new(sources))
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve `isbn` to a record, or `None` when every source came up empty.
    pub fn resolve(&self, isbn: &CanonicalIsbn) -> Option<BookRecord> {
        for source in &self.sources {
            tracing::debug!(source = source.name(), %isbn, "querying metadata source");
            match source.lookup_isbn(isbn) {
                Ok(Some(record)) => {
                    tracing::info!(source = source.name(), %isbn, title = %record.title, "resolved book");
                    return Some(record);
                }
                Ok(None) => {
                    tracing::debug!(source = source.name(), %isbn, "no match");
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), %isbn, error = %e, "metadata source failed");
                }
            }
        }
        tracing::info!(%isbn, "book not found in any source");
        None
    }
}

/// Map a transport error from `provider` onto [`LookupError`].
pub(crate) fn transport_error(provider: &str, timeout: Duration, e: reqwest::Error) -> LookupError {
    if e.is_timeout() {
        LookupError::Timeout {
            provider: provider.to_string(),
            seconds: timeout.as_secs(),
        }
    } else if let Some(status) = e.status() {
        LookupError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
        }
    } else {
        LookupError::Network(e.to_string())
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, LookupError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("reading-log/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LookupError::Client(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isbn::normalize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behavior {
        Hit(&'static str),
        Miss,
        Fail,
    }

    struct FakeSource {
        name: &'static str,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn boxed(name: &'static str, behavior: Behavior, calls: &Arc<AtomicUsize>) -> Box<dyn MetadataSource> {
            Box::new(Self {
                name,
                behavior,
                calls: Arc::clone(calls),
            })
        }
    }

    impl MetadataSource for FakeSource {
        fn name(&self) -> &str {
            self.name
        }

        fn lookup_isbn(&self, isbn: &CanonicalIsbn) -> Result<Option<BookRecord>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Hit(title) => Ok(Some(BookRecord {
                    title: title.to_string(),
                    ..BookRecord::new(isbn.clone())
                })),
                Behavior::Miss => Ok(None),
                Behavior::Fail => Err(LookupError::Network("connection refused".to_string())),
            }
        }
    }

    #[test]
    fn first_source_wins_and_second_is_not_called() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let resolver = MetadataResolver::new(vec![
            FakeSource::boxed("a", Behavior::Hit("from a"), &a),
            FakeSource::boxed("b", Behavior::Hit("from b"), &b),
        ]);
        let rec = resolver.resolve(&normalize("9784065199816")).unwrap();
        assert_eq!(rec.title, "from a");
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn miss_falls_through() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let resolver = MetadataResolver::new(vec![
            FakeSource::boxed("a", Behavior::Miss, &a),
            FakeSource::boxed("b", Behavior::Hit("from b"), &b),
        ]);
        let rec = resolver.resolve(&normalize("9784065199816")).unwrap();
        assert_eq!(rec.title, "from b");
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_falls_through() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let resolver = MetadataResolver::new(vec![
            FakeSource::boxed("a", Behavior::Fail, &a),
            FakeSource::boxed("b", Behavior::Hit("from b"), &b),
        ]);
        assert_eq!(resolver.resolve(&normalize("123")).unwrap().title, "from b");
    }

    #[test]
    fn all_sources_exhausted_is_none() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = MetadataResolver::new(vec![
            FakeSource::boxed("a", Behavior::Miss, &calls),
            FakeSource::boxed("b", Behavior::Fail, &calls),
        ]);
        assert!(resolver.resolve(&normalize("9784065199816")).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_isbn_is_tolerated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = MetadataResolver::new(vec![FakeSource::boxed("a", Behavior::Miss, &calls)]);
        assert!(resolver.resolve(&normalize("")).is_none());
    }

    #[test]
    fn from_config_respects_source_order() {
        let config = LookupConfig {
            sources: vec![SourceKind::Ndl, SourceKind::Openbd],
            ..LookupConfig::default()
        };
        let resolver = MetadataResolver::from_config(&config).unwrap();
        assert_eq!(resolver.source_names(), vec!["ndl", "openbd"]);
    }
}
