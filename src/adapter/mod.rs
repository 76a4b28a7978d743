//! Data adapters: the pluggable read/write endpoints of the crate.
//!
//! An adapter binds a connection (a file path, or a database client) to a
//! formatter pair and two direction-bound [`ConvertProcessor`]s. The reading
//! side streams blocks of rows as [`Table`]s through an explicit cursor; the
//! writing side consumes a stream of tables and appends them to the
//! destination, emitting the header only when the destination is new.
//!
//! [`ConvertProcessor`]: crate::convert::ConvertProcessor

mod csv;
mod db;
mod fixed;
mod flat_file;
mod jsonl;
mod xml;

pub use csv::CsvAdapter;
pub use db::{DbAdapter, DbClient, MemoryDbClient};
pub use fixed::FixedTextAdapter;
pub use flat_file::{FileBlocks, FlatFileAdapter};
pub use jsonl::JsonLinesAdapter;
pub use xml::XmlAdapter;

use crate::culture::Culture;
use crate::error::Result;
use crate::fields::Field;
use crate::mapping::RecordMapping;
use crate::table::{Table, Value};
use encoding_rs::{Encoding, UTF_8};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read as _};
use std::path::{Path, PathBuf};

/// A stream of row blocks. Each item is one block-sized [`Table`]; the first
/// block's schema is the template for the rest of the stream.
pub type Blocks<'a> = Box<dyn Iterator<Item = Result<Table>> + 'a>;

/// Reading capability of an adapter.
pub trait DataReader {
    /// Streams the source as blocks of at most `block_size` rows.
    /// `None` reads everything into a single block.
    fn read_blocks(&mut self, block_size: Option<usize>) -> Result<Blocks<'_>>;

    /// Number of data rows in the source, without materializing them.
    fn count(&mut self) -> Result<usize>;

    /// The source's column descriptors, from its header or first record.
    fn available_columns(&mut self) -> Result<Vec<Field>>;

    /// Names of the tables the source can produce. Flat files have exactly
    /// one; an XML document has one per distinct element path.
    fn available_tables(&mut self) -> Result<Vec<String>>;
}

/// Writing capability of an adapter.
pub trait DataWriter {
    /// Consumes a stream of tables and appends each block to the
    /// destination. With `delete_before`, existing data at each destination
    /// is removed before its first block; re-running the same write is
    /// idempotent.
    fn write_blocks(
        &mut self,
        blocks: &mut dyn Iterator<Item = Table>,
        delete_before: bool,
    ) -> Result<()>;
}

/// Convenience surface over any [`DataReader`].
pub trait ReaderExt: DataReader {
    /// Reads the whole source as one table.
    fn read_all(&mut self) -> Result<Table> {
        let mut blocks = self.read_blocks(None)?;
        match blocks.next() {
            Some(block) => block,
            None => Ok(Table::new("")),
        }
    }

    /// Streams the source as typed records through a [`RecordMapping`],
    /// converting under the invariant culture. Rows convert lazily, block
    /// by block; a required field that comes up null yields an `Err` for
    /// that record and the stream continues.
    fn read_as<'a, T: Default + 'a>(
        &'a mut self,
        mapping: &'a RecordMapping<T>,
        block_size: Option<usize>,
    ) -> Result<Box<dyn Iterator<Item = Result<T>> + 'a>> {
        self.read_as_with_culture(mapping, block_size, Culture::invariant())
    }

    /// Like [`read_as`], but the mapping's field converters run under the
    /// given culture, e.g. a read processor's default culture.
    ///
    /// [`read_as`]: ReaderExt::read_as
    fn read_as_with_culture<'a, T: Default + 'a>(
        &'a mut self,
        mapping: &'a RecordMapping<T>,
        block_size: Option<usize>,
        culture: Culture,
    ) -> Result<Box<dyn Iterator<Item = Result<T>> + 'a>> {
        let blocks = self.read_blocks(block_size)?;
        Ok(Box::new(blocks.flat_map(move |block| match block {
            Ok(table) => table
                .rows()
                .iter()
                .map(|row| mapping.from_row(&table, row, &culture))
                .collect::<Vec<_>>(),
            Err(err) => vec![Err(err)],
        })))
    }

    /// Streams the source as one name-to-value map per row.
    fn read_as_maps<'a>(
        &'a mut self,
        block_size: Option<usize>,
    ) -> Result<Box<dyn Iterator<Item = Result<BTreeMap<String, Value>>> + 'a>> {
        let blocks = self.read_blocks(block_size)?;
        Ok(Box::new(blocks.flat_map(|block| match block {
            Ok(table) => {
                let names: Vec<String> =
                    table.columns().iter().map(|c| c.name.clone()).collect();
                table
                    .rows()
                    .iter()
                    .map(|row| {
                        let mut map = BTreeMap::new();
                        for (i, name) in names.iter().enumerate() {
                            map.insert(
                                name.clone(),
                                row.get(i).cloned().unwrap_or(Value::Null),
                            );
                        }
                        Ok(map)
                    })
                    .collect::<Vec<_>>()
            }
            Err(err) => vec![Err(err)],
        })))
    }
}

impl<R: DataReader + ?Sized> ReaderExt for R {}

/// Convenience surface over any [`DataWriter`].
pub trait WriterExt: DataWriter {
    /// Writes a single table as one block.
    fn write_table(&mut self, table: &Table, delete_before: bool) -> Result<()> {
        let mut blocks = std::iter::once(table.clone());
        self.write_blocks(&mut blocks, delete_before)
    }

    /// Writes a stream of typed records through a [`RecordMapping`],
    /// chunked into `block_size`-row tables (`None` writes one block).
    fn write_from<T: Default>(
        &mut self,
        mapping: &RecordMapping<T>,
        records: impl IntoIterator<Item = T>,
        table_name: &str,
        block_size: Option<usize>,
        delete_before: bool,
    ) -> Result<()> {
        let schema = mapping.schema(table_name);
        let mut records = records.into_iter();
        let mut chunks = std::iter::from_fn(|| {
            let mut table = schema.clone_schema();
            loop {
                let Some(record) = records.next() else { break };
                let row = mapping.to_row(&table, &record);
                table.add_row(row).expect("mapping rows match the mapping schema");
                if let Some(n) = block_size
                    && table.row_count() >= n
                {
                    break;
                }
            }
            if table.is_empty() { None } else { Some(table) }
        });
        self.write_blocks(&mut chunks, delete_before)
    }
}

impl<W: DataWriter + ?Sized> WriterExt for W {}

/// A file destination or source: path plus text encoding.
#[derive(Debug, Clone)]
pub struct FileConnection {
    pub path: PathBuf,
    pub encoding: &'static Encoding,
}

impl FileConnection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileConnection { path: path.into(), encoding: UTF_8 }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sniffs the file's byte-order mark and adopts the encoding it names;
    /// without a BOM the configured encoding stays in effect.
    pub fn detect_encoding(&mut self) -> Result<&'static Encoding> {
        let mut head = [0u8; 3];
        let mut file = File::open(&self.path)?;
        let n = file.read(&mut head)?;
        if let Some((encoding, _bom_len)) = Encoding::for_bom(&head[..n]) {
            self.encoding = encoding;
        }
        Ok(self.encoding)
    }

    /// Destination file stem, used as the default table name.
    pub fn table_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Streams a text file line by line, decoding incrementally from the
/// connection's encoding. A BOM matching the encoding is consumed, line
/// endings (`\n`, `\r\n`) are stripped.
pub struct DecodingLineReader {
    input: BufReader<File>,
    decoder: encoding_rs::Decoder,
    pending: String,
    at_eof: bool,
}

impl DecodingLineReader {
    pub fn open(path: &Path, encoding: &'static Encoding) -> Result<Self> {
        let file = File::open(path)?;
        Ok(DecodingLineReader {
            input: BufReader::new(file),
            decoder: encoding.new_decoder(),
            pending: String::new(),
            at_eof: false,
        })
    }

    pub fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(pos) = self.pending.find('\n') {
                let mut line: String = self.pending.drain(..=pos).collect();
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
                return Ok(Some(line));
            }
            if self.at_eof {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let mut line = std::mem::take(&mut self.pending);
                if line.ends_with('\r') {
                    line.pop();
                }
                return Ok(Some(line));
            }

            let chunk = self.input.fill_buf()?;
            if chunk.is_empty() {
                self.at_eof = true;
                let mut tail = String::with_capacity(8);
                let _ = self.decoder.decode_to_string(&[], &mut tail, true);
                self.pending.push_str(&tail);
                continue;
            }
            let capacity = self
                .decoder
                .max_utf8_buffer_length(chunk.len())
                .unwrap_or(chunk.len() * 4);
            let mut decoded = String::with_capacity(capacity);
            let (_, consumed, _) = self.decoder.decode_to_string(chunk, &mut decoded, false);
            self.input.consume(consumed);
            self.pending.push_str(&decoded);
        }
    }
}
