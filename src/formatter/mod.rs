//! Formatters translate between one external textual representation and the
//! common [`Table`](crate::table::Table) model, in both directions.
//!
//! Line-based formatters (CSV, fixed-width, JSON-lines) implement
//! [`ReadFormatter`]/[`WriteFormatter`]; the XML formatters have their own
//! fragment-oriented surface in [`xpath`] because their unit of exchange is
//! an XML fragment, not a line.

mod csv;
mod fixed;
mod jsonl;
mod xpath;

pub use csv::{CsvOptions, CsvReadFormatter, CsvWriteFormatter, SharedCsvOptions, shared_csv_options};
pub use fixed::{
    FixedLengthReadFormatter, FixedLengthWriteFormatter, FixedOptions, SharedFixedOptions,
    shared_fixed_options,
};
pub use jsonl::{JsonLinesReadFormatter, JsonLinesWriteFormatter};
pub use xpath::{
    XPathMapping, XPathReadFormatter, XPathWriteFormatter, XmlNamespace, unescape_xml,
};

use crate::error::Result;
use crate::table::Table;

/// One rendered block of output: an optional header line plus the data
/// lines. Keeping the header separate lets the adapter decide whether to
/// emit it (only when the destination is new) without the "line zero is
/// special" convention.
#[derive(Debug, Clone, Default)]
pub struct RenderedBlock {
    pub header: Option<String>,
    pub lines: Vec<String>,
}

/// Parses a batch of raw lines into a table.
pub trait ReadFormatter: Send {
    /// When `template` is given, its schema is cloned and every line is a
    /// data line; otherwise the formatter infers the schema (for most
    /// formats from a header line, see [`uses_header_line`](Self::uses_header_line)).
    fn parse(&mut self, lines: &[String], template: Option<&Table>) -> Result<Table>;

    /// Whether the first line of the source is a header line rather than
    /// data. JSON-lines has no header; CSV and fixed-width do.
    fn uses_header_line(&self) -> bool {
        true
    }
}

/// Renders a table into lines.
pub trait WriteFormatter: Send {
    fn render(&mut self, table: &Table) -> Result<RenderedBlock>;
}
