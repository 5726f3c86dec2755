//! XML settlement-report parser.
//!
//! Turns a raw report document into a [`RawTable`]: one [`RawRecord`] per
//! `<Row>` element, each holding the tag/text pairs of the row's flat child
//! elements. Values stay as text here; numeric and time coercion happens in
//! [`crate::normalize`].
//!
//! ```text
//! <REPORT>
//!   <Row>
//!     <START_TIME>2024-01-15T09:00:00</START_TIME>
//!     <IMBALANCE_PRICE>12.5</IMBALANCE_PRICE>
//!     <NET_IMBALANCE_VOLUME>-40</NET_IMBALANCE_VOLUME>
//!   </Row>
//! </REPORT>
//! ```

use indexmap::{IndexMap, IndexSet};
use quick_xml::{Reader, events::Event};
use thiserror::Error;

const ROW_TAG: &[u8] = b"Row";

/// Field name -> raw text for one `<Row>`, in document order.
pub type RawRecord = IndexMap<String, String>;

/// Errors produced while parsing a report document.
///
/// Kept distinct from fetch failures so the caller can tell "malformed" apart
/// from "unavailable".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The bytes are not well-formed XML.
    #[error("malformed report XML: {message}")]
    Malformed { message: String },

    /// The document is well-formed but has no `<Row>` elements.
    #[error("report XML contains no <Row> elements")]
    NoRows,
}

/// Row-oriented table of untyped report records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of every record's field names, in first-seen order.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: IndexSet<&str> = IndexSet::new();
        for record in &self.records {
            names.extend(record.keys().map(String::as_str));
        }
        names.into_iter().map(str::to_string).collect()
    }
}

/// In-progress `<Row>` while the reader walks its children.
struct RowState {
    depth: usize,
    record: RawRecord,
    field: Option<(String, String)>,
}

/// Parses a report document into a [`RawTable`].
///
/// `<Row>` elements are matched at any depth below the root. Empty child
/// elements produce an empty string value; when a field repeats within one
/// row the last value wins.
pub fn parse_report(bytes: &[u8]) -> Result<RawTable, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut saw_root = false;
    let mut records = Vec::new();
    let mut row: Option<RowState> = None;

    loop {
        match reader.read_event_into(&mut buf).map_err(malformed)? {
            Event::Start(e) => {
                if depth == 0 {
                    if saw_root {
                        return Err(malformed("more than one root element"));
                    }
                    saw_root = true;
                }
                depth += 1;

                let is_row = e.name().as_ref() == ROW_TAG;
                match row.as_mut() {
                    None if is_row => {
                        row = Some(RowState {
                            depth,
                            record: RawRecord::new(),
                            field: None,
                        });
                    }
                    Some(state) if depth == state.depth + 1 => {
                        state.field = Some((tag_name(e.name().as_ref()), String::new()));
                    }
                    _ => {}
                }
            }
            Event::Empty(_) if depth == 0 => {
                if saw_root {
                    return Err(malformed("more than one root element"));
                }
                saw_root = true;
            }
            Event::Empty(e) => {
                let is_row = e.name().as_ref() == ROW_TAG;
                match row.as_mut() {
                    None if is_row => records.push(RawRecord::new()),
                    Some(state) if depth == state.depth => {
                        state
                            .record
                            .insert(tag_name(e.name().as_ref()), String::new());
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if depth == 0 {
                    return Err(malformed("text outside the root element"));
                }
                if let Some((_, value)) = open_field(&mut row, depth) {
                    value.push_str(&t.unescape().map_err(malformed)?);
                }
            }
            Event::CData(c) => {
                if let Some((_, value)) = open_field(&mut row, depth) {
                    value.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                match row.as_ref().map(|state| state.depth) {
                    Some(row_depth) if depth == row_depth + 1 => {
                        if let Some(state) = row.as_mut() {
                            if let Some((name, value)) = state.field.take() {
                                state.record.insert(name, value);
                            }
                        }
                    }
                    Some(row_depth) if depth == row_depth => {
                        if let Some(done) = row.take() {
                            records.push(done.record);
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(malformed("document has no root element"));
    }
    if depth != 0 {
        return Err(malformed("unclosed element at end of document"));
    }
    if records.is_empty() {
        return Err(ParseError::NoRows);
    }

    Ok(RawTable::new(records))
}

/// The open field of the current row, if the reader sits directly inside it.
fn open_field(row: &mut Option<RowState>, depth: usize) -> Option<&mut (String, String)> {
    let state = row.as_mut()?;
    if depth == state.depth + 1 {
        state.field.as_mut()
    } else {
        None
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn malformed(err: impl std::fmt::Display) -> ParseError {
    ParseError::Malformed {
        message: err.to_string(),
    }
}
