//! openBD metadata provider (JSON, summary + ONIX).
//!
//! The ONIX half of the payload is loosely shaped: a node documented as a list
//! may arrive as a single object, text may be a bare string or an object with
//! a `content` key. Every lookup below therefore walks the raw
//! `serde_json::Value` and defaults per field instead of deserializing into a
//! fixed schema.

use std::time::Duration;

use serde_json::Value;

use crate::error::LookupError;
use crate::isbn::CanonicalIsbn;
use crate::lookup::extent::parse_page_count;
use crate::lookup::{build_client, transport_error, MetadataSource};
use crate::record::BookRecord;

const PROVIDER: &str = "openbd";

/// ONIX code list values.
const ROLE_AUTHOR: &str = "A01";
const DATE_ROLE_PUBLICATION: &str = "01";
const EXTENT_TYPES_PAGES: &[&str] = &["00", "11"];
const RESOURCE_FRONT_COVER: &str = "01";

static NULL: Value = Value::Null;

pub struct OpenBdProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    timeout: Duration,
}

impl OpenBdProvider {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, LookupError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.to_string(),
            timeout,
        })
    }
}

impl MetadataSource for OpenBdProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn lookup_isbn(&self, isbn: &CanonicalIsbn) -> Result<Option<BookRecord>, LookupError> {
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[("isbn", isbn.as_str())])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;
        parse_openbd_response(&body, isbn)
    }
}

/// Parse a raw openBD response body. `Ok(None)` when the array is empty or its
/// first element is `null`; a first element that is not an object is malformed.
pub fn parse_openbd_response(body: &str, isbn: &CanonicalIsbn) -> Result<Option<BookRecord>, LookupError> {
    let v: Value = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    match envelope(&v) {
        Some(book) if book.is_object() => Ok(Some(extract_record(book, isbn))),
        Some(other) => Err(malformed(format!("expected an object, found {other}"))),
        None => Ok(None),
    }
}

fn malformed(detail: String) -> LookupError {
    LookupError::Malformed {
        provider: PROVIDER.to_string(),
        detail,
    }
}

fn envelope(v: &Value) -> Option<&Value> {
    v.as_array()?.first().filter(|book| !book.is_null())
}

fn extract_record(book: &Value, isbn: &CanonicalIsbn) -> BookRecord {
    let summary = book.get("summary").unwrap_or(&NULL);
    let onix = book.get("onix").unwrap_or(&NULL);

    BookRecord {
        title: summary_text(summary, "title").unwrap_or_else(|| onix_title(onix)),
        author: summary_text(summary, "author").unwrap_or_else(|| onix_author(onix)),
        publisher: summary_text(summary, "publisher").unwrap_or_else(|| onix_publisher(onix)),
        pubdate: summary_text(summary, "pubdate").unwrap_or_else(|| onix_pubdate(onix)),
        total_pages: match summary_text(summary, "extent").map(|s| parse_page_count(&s)) {
            Some(pages) if pages > 0 => pages,
            _ => onix_pages(onix),
        },
        cover_image: summary_text(summary, "cover").unwrap_or_else(|| onix_cover(onix)),
        ..BookRecord::new(isbn.clone())
    }
}

fn summary_text(summary: &Value, key: &str) -> Option<String> {
    let s = text(summary.get(key));
    (!s.trim().is_empty()).then_some(s)
}

fn onix_title(onix: &Value) -> String {
    let detail = first(descend(onix, &["DescriptiveDetail", "TitleDetail"]));
    let element = first(descend(detail, &["TitleElement"]));
    text(element.get("TitleText"))
}

fn onix_author(onix: &Value) -> String {
    let contributors = list(descend(onix, &["DescriptiveDetail", "Contributor"]));
    contributors
        .iter()
        .find(|c| has_code(c.get("ContributorRole"), ROLE_AUTHOR))
        .or_else(|| contributors.first())
        .map(|c| text(c.get("PersonName")))
        .unwrap_or_default()
}

fn onix_publisher(onix: &Value) -> String {
    let publisher = text(first(descend(onix, &["PublishingDetail", "Publisher"])).get("PublisherName"));
    if !publisher.is_empty() {
        return publisher;
    }
    text(first(descend(onix, &["PublishingDetail", "Imprint"])).get("ImprintName"))
}

fn onix_pubdate(onix: &Value) -> String {
    list(descend(onix, &["PublishingDetail", "PublishingDate"]))
        .iter()
        .find(|d| has_code(d.get("PublishingDateRole"), DATE_ROLE_PUBLICATION))
        .map(|d| text(d.get("Date")))
        .unwrap_or_default()
}

fn onix_pages(onix: &Value) -> u32 {
    list(descend(onix, &["DescriptiveDetail", "Extent"]))
        .iter()
        .find(|e| EXTENT_TYPES_PAGES.iter().any(|code| has_code(e.get("ExtentType"), code)))
        .map(|e| parse_page_count(&text(e.get("ExtentValue"))))
        .unwrap_or(0)
}

fn onix_cover(onix: &Value) -> String {
    let resource = list(descend(onix, &["CollateralDetail", "SupportingResource"]))
        .iter()
        .find(|r| has_code(r.get("ResourceContentType"), RESOURCE_FRONT_COVER));
    match resource {
        Some(r) => {
            let version = first(r.get("ResourceVersion"));
            text(Some(first(version.get("ResourceLink"))))
        }
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Get-or-default access over an untyped tree
// ---------------------------------------------------------------------------

/// Follow object keys; a missing key or non-object node ends the walk.
fn descend<'a>(node: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(node, |n, k| n.get(*k))
}

/// View a node as a list: arrays as-is, `null`/missing as empty, anything
/// else as a one-element list.
fn list(node: Option<&Value>) -> &[Value] {
    match node {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => std::slice::from_ref(other),
    }
}

/// First element of [`list`], or `null`.
fn first(node: Option<&Value>) -> &Value {
    list(node).first().unwrap_or(&NULL)
}

/// Text of a node: a string, a number, or an object's `content`.
fn text(node: Option<&Value>) -> String {
    match node {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(obj @ Value::Object(_)) => text(obj.get("content")),
        _ => String::new(),
    }
}

/// Whether a code node (scalar or list of scalars) contains `code`.
fn has_code(node: Option<&Value>, code: &str) -> bool {
    list(node).iter().any(|v| text(Some(v)) == code)
}
