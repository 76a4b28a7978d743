//! # Rowlink
//!
//! A **pluggable tabular data-interchange library** for Rust. Rowlink moves
//! rows between heterogeneous endpoints — delimited text, fixed-width text,
//! JSON lines, XML documents, databases — through one common in-memory
//! table model, streaming block by block so arbitrarily large sources fit
//! in bounded memory.
//!
//! ## Key Features
//!
//! - **Common table model** - typed cells with a distinguished null, named
//!   columns, schema checks on row insertion
//! - **Block streaming** - explicit cursors yield block-sized tables; the
//!   first block's schema is the template for the rest of the stream
//! - **Pluggable adapters** - CSV, fixed-width, JSON-lines and XML file
//!   adapters built by composition over one flat-file core, plus a
//!   database write contract providers implement
//! - **Value conversion** - per-field converter chains, direction-aware
//!   (lenient on read, strict on write), culture-sensitive number, date
//!   and boolean handling with per-row culture resolution
//! - **Field mapping** - ordered source-to-table field definitions with
//!   activation flags shared between the read and write direction
//! - **Typed records** - map rows onto your own structs through an
//!   explicit builder, no reflection involved
//! - **Background tasks** - push a read-transform-write chain onto a
//!   worker thread and wait for it when the result is needed
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowlink::adapter::{CsvAdapter, DataReader, DataWriter, WriterExt};
//!
//! # fn main() -> rowlink::error::Result<()> {
//! let mut source = CsvAdapter::new("people.csv");
//! let mut target = CsvAdapter::new("people_out.csv");
//! target.set_separator(',');
//!
//! // stream in blocks of 500 rows, replacing previous output
//! let mut blocks = source.read_blocks(Some(500))?
//!     .collect::<Result<Vec<_>, _>>()?
//!     .into_iter();
//! target.write_blocks(&mut blocks, true)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Table
//!
//! A [`Table`](table::Table) is the unit of exchange: named, typed columns
//! plus rows of positional [`Value`](table::Value)s. Every adapter reads
//! into and writes out of this one shape.
//!
//! ### Adapters
//!
//! [`DataReader`](adapter::DataReader) and
//! [`DataWriter`](adapter::DataWriter) are the two capability traits; an
//! adapter implements one or both. File adapters pair a connection with a
//! read/write formatter and two convert processors.
//!
//! ### Converters
//!
//! A [`ValueConverter`](convert::ValueConverter) normalizes external
//! representations into typed cells on read and renders them back on
//! write. Conversion is lenient inbound (unparsable values pass through)
//! and strict outbound (failures raise
//! [`ConversionFailed`](error::RowlinkError::ConversionFailed)).

pub mod adapter;
pub mod convert;
pub mod culture;
pub mod error;
pub mod fields;
pub mod formatter;
pub mod mapping;
pub mod table;
pub mod tasks;

pub use adapter::{
    Blocks, CsvAdapter, DataReader, DataWriter, DbAdapter, DbClient, FileConnection,
    FixedTextAdapter, FlatFileAdapter, JsonLinesAdapter, MemoryDbClient, ReaderExt, WriterExt,
    XmlAdapter,
};
pub use convert::{
    BooleanAutoConverter, ConvertDirection, ConvertProcessor, ConverterDefinition,
    DateTimeAutoConverter, DateTimeFormatConverter, IdentityConverter, NumberAutoConverter,
    NumberFormatConverter, ValueConverter,
};
pub use culture::{Culture, LocaleService};
pub use error::{BulkWriteReport, Result, RowError, RowlinkError};
pub use fields::{Field, FieldDefinition, FieldDefinitionList, SharedFieldDefinitions};
pub use mapping::RecordMapping;
pub use table::{Column, DataSet, DataType, Row, Table, Value};
pub use tasks::{Task, spawn};
