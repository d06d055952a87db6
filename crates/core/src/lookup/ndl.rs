//! NDL Search metadata provider (SRU `searchRetrieve`, `dcndl` schema).

use std::collections::HashMap;
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::error::LookupError;
use crate::isbn::CanonicalIsbn;
use crate::lookup::extent::parse_page_count;
use crate::lookup::{build_client, transport_error, MetadataSource};
use crate::record::BookRecord;

const PROVIDER: &str = "ndl";

const NS_SRW: &[u8] = b"http://www.loc.gov/zing/srw/";
const NS_DC: &[u8] = b"http://purl.org/dc/elements/1.1/";
const NS_DCTERMS: &[u8] = b"http://purl.org/dc/terms/";
const NS_DCNDL: &[u8] = b"http://ndl.go.jp/dcndl/terms/";

pub struct NdlProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    timeout: Duration,
}

impl NdlProvider {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, LookupError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.to_string(),
            timeout,
        })
    }
}

impl MetadataSource for NdlProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn lookup_isbn(&self, isbn: &CanonicalIsbn) -> Result<Option<BookRecord>, LookupError> {
        let query = format!("isbn=\"{isbn}\"");
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("operation", "searchRetrieve"),
                ("version", "1.2"),
                ("query", query.as_str()),
                ("recordSchema", "dcndl"),
                ("maximumRecords", "1"),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;
        parse_sru_response(&body, isbn)
    }
}

/// Bibliographic fields pulled from one SRU record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DcField {
    Title,
    Author,
    Publisher,
    Pubdate,
    Extent,
}

/// Element → field, with a rank (lower wins) for when a record carries both
/// the Dublin Core and the DC Terms form.
fn classify(ns: &[u8], local: &[u8]) -> Option<(DcField, u8)> {
    let hit = match (ns, local) {
        (NS_DC, b"title") => (DcField::Title, 0),
        (NS_DC, b"creator") => (DcField::Author, 0),
        (NS_DC, b"publisher") => (DcField::Publisher, 0),
        (NS_DC, b"date") => (DcField::Pubdate, 0),
        (NS_DCNDL, b"extent") => (DcField::Extent, 0),
        (NS_DCTERMS, b"title") => (DcField::Title, 1),
        (NS_DCTERMS, b"creator") => (DcField::Author, 1),
        (NS_DCTERMS, b"publisher") => (DcField::Publisher, 1),
        (NS_DCTERMS, b"date") => (DcField::Pubdate, 1),
        (NS_DCTERMS, b"issued") => (DcField::Pubdate, 2),
        (NS_DCTERMS, b"extent") => (DcField::Extent, 1),
        _ => return None,
    };
    Some(hit)
}

#[derive(Default)]
struct Fields(HashMap<DcField, (u8, String)>);

impl Fields {
    fn offer(&mut self, field: DcField, rank: u8, value: &str) {
        match self.0.get(&field) {
            Some((held, _)) if *held <= rank => {}
            _ => {
                self.0.insert(field, (rank, value.to_string()));
            }
        }
    }

    fn take(&mut self, field: DcField) -> String {
        self.0.remove(&field).map(|(_, v)| v).unwrap_or_default()
    }
}

/// Element currently being read for a field.
struct Capture {
    field: DcField,
    rank: u8,
    depth: usize,
    filled: bool,
}

/// Parse an SRU `searchRetrieveResponse`. `Ok(None)` when it holds no record.
pub fn parse_sru_response(xml: &str, isbn: &CanonicalIsbn) -> Result<Option<BookRecord>, LookupError> {
    let mut fields = Fields::default();
    if !scan(xml, &mut fields, false)? {
        return Ok(None);
    }
    let extent = fields.take(DcField::Extent);
    Ok(Some(BookRecord {
        title: fields.take(DcField::Title),
        author: fields.take(DcField::Author),
        publisher: fields.take(DcField::Publisher),
        pubdate: fields.take(DcField::Pubdate),
        total_pages: parse_page_count(&extent),
        ..BookRecord::new(isbn.clone())
    }))
}

/// Walk `xml` collecting DC fields from the first `srw:record`. With
/// `in_record` the whole document is treated as record content (used for
/// string-packed record data). Only text sitting directly in `srw:recordData`
/// is re-parsed as packed markup. Returns whether a record was seen.
fn scan(xml: &str, fields: &mut Fields, in_record: bool) -> Result<bool, LookupError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut record_depth: Option<usize> = in_record.then_some(0);
    let mut capture: Option<Capture> = None;
    let mut data_depth: Option<usize> = None;

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(malformed)?;
        match event {
            Event::Start(ref e) => {
                depth += 1;
                let ns = bound(&ns);
                let local = e.local_name();
                if record_depth.is_none() {
                    if ns == Some(NS_SRW) && local.as_ref() == b"record" {
                        record_depth = Some(depth);
                    }
                } else if !in_record && ns == Some(NS_SRW) && local.as_ref() == b"recordData" {
                    data_depth = Some(depth);
                } else if capture.is_none() {
                    if let Some((field, rank)) = ns.and_then(|ns| classify(ns, local.as_ref())) {
                        capture = Some(Capture { field, rank, depth, filled: false });
                    }
                }
            }
            Event::Text(ref e) if record_depth.is_some() => {
                let text = e.unescape().map_err(malformed)?;
                let packed = data_depth == Some(depth);
                take_text(text.trim(), packed, fields, &mut capture)?;
            }
            Event::CData(ref e) if record_depth.is_some() => {
                let text = String::from_utf8_lossy(e);
                let packed = data_depth == Some(depth);
                take_text(text.trim(), packed, fields, &mut capture)?;
            }
            Event::End(_) => {
                if capture.as_ref().is_some_and(|c| c.depth == depth) {
                    capture = None;
                }
                if data_depth == Some(depth) {
                    data_depth = None;
                }
                if record_depth == Some(depth) {
                    break;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(record_depth.is_some())
}

fn take_text(text: &str, packed: bool, fields: &mut Fields, capture: &mut Option<Capture>) -> Result<(), LookupError> {
    if text.is_empty() {
        return Ok(());
    }
    match capture {
        Some(c) if !c.filled => {
            fields.offer(c.field, c.rank, text);
            c.filled = true;
        }
        Some(_) => {}
        // recordPacking=string: the record arrives as escaped markup.
        None if packed && text.starts_with('<') => {
            scan(text, fields, true)?;
        }
        None => {}
    }
    Ok(())
}

fn bound<'a>(ns: &'a ResolveResult<'_>) -> Option<&'a [u8]> {
    match ns {
        ResolveResult::Bound(Namespace(ns)) => Some(*ns),
        _ => None,
    }
}

fn malformed(e: impl std::fmt::Display) -> LookupError {
    LookupError::Malformed {
        provider: PROVIDER.to_string(),
        detail: e.to_string(),
    }
}
