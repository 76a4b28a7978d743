//! The line-oriented file adapter all flat formats build on.

use crate::convert::{ConvertDirection, ConvertProcessor};
use crate::error::Result;
use crate::fields::Field;
use crate::formatter::{ReadFormatter, WriteFormatter};
use crate::table::Table;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::PathBuf;
use tracing::debug;

use super::{Blocks, DataReader, DataWriter, DecodingLineReader, FileConnection};

/// Reads and writes one flat text file through an exchanged formatter pair.
///
/// The concrete flat adapters ([`CsvAdapter`](super::CsvAdapter),
/// [`FixedTextAdapter`](super::FixedTextAdapter),
/// [`JsonLinesAdapter`](super::JsonLinesAdapter)) wrap this with the
/// matching formatters; everything about files, encodings, blocks, headers
/// and append lives here.
pub struct FlatFileAdapter {
    pub connection: FileConnection,
    read_formatter: Box<dyn ReadFormatter>,
    write_formatter: Box<dyn WriteFormatter>,
    pub read_converter: ConvertProcessor,
    pub write_converter: ConvertProcessor,
}

impl FlatFileAdapter {
    pub fn new(
        connection: FileConnection,
        read_formatter: Box<dyn ReadFormatter>,
        write_formatter: Box<dyn WriteFormatter>,
    ) -> Self {
        FlatFileAdapter {
            connection,
            read_formatter,
            write_formatter,
            read_converter: ConvertProcessor::new(ConvertDirection::Read),
            write_converter: ConvertProcessor::new(ConvertDirection::Write),
        }
    }

    fn destination_for(&self, table: &Table) -> PathBuf {
        // an empty connection path means "one file per table name"
        if self.connection.path.as_os_str().is_empty() {
            PathBuf::from(&table.name)
        } else {
            self.connection.path.clone()
        }
    }
}

impl DataReader for FlatFileAdapter {
    fn read_blocks(&mut self, block_size: Option<usize>) -> Result<Blocks<'_>> {
        let reader = DecodingLineReader::open(&self.connection.path, self.connection.encoding)?;
        Ok(Box::new(FileBlocks {
            reader,
            formatter: &mut self.read_formatter,
            converter: &self.read_converter,
            table_name: self.connection.table_name(),
            block_size,
            header: None,
            yielded_any: false,
            done: false,
        }))
    }

    fn count(&mut self) -> Result<usize> {
        let mut reader =
            DecodingLineReader::open(&self.connection.path, self.connection.encoding)?;
        let mut lines = 0usize;
        while reader.next_line()?.is_some() {
            lines += 1;
        }
        if self.read_formatter.uses_header_line() {
            lines = lines.saturating_sub(1);
        }
        Ok(lines)
    }

    fn available_columns(&mut self) -> Result<Vec<Field>> {
        let mut blocks = self.read_blocks(Some(1))?;
        let Some(block) = blocks.next() else {
            return Ok(Vec::new());
        };
        let table = block?;
        Ok(table
            .columns()
            .iter()
            .map(|c| Field::new(c.name.clone()).typed(c.data_type))
            .collect())
    }

    fn available_tables(&mut self) -> Result<Vec<String>> {
        Ok(vec![self.connection.table_name()])
    }
}

impl DataWriter for FlatFileAdapter {
    fn write_blocks(
        &mut self,
        blocks: &mut dyn Iterator<Item = Table>,
        delete_before: bool,
    ) -> Result<()> {
        let mut current: Option<PathBuf> = None;
        let mut output: Option<BufWriter<std::fs::File>> = None;
        let mut write_header = false;
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for mut table in blocks {
            self.write_converter.apply_table(&mut table)?;
            let destination = self.destination_for(&table);

            if current.as_deref() != Some(destination.as_path()) {
                if let Some(mut finished) = output.take() {
                    finished.flush()?;
                }
                if let Some(parent) = destination.parent()
                    && !parent.as_os_str().is_empty()
                {
                    fs::create_dir_all(parent)?;
                }
                if delete_before && seen.insert(destination.clone()) && destination.exists() {
                    fs::remove_file(&destination)?;
                }
                let is_new = !destination.exists();
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&destination)?;
                debug!(path = %destination.display(), is_new, "opened write destination");
                output = Some(BufWriter::new(file));
                write_header = is_new;
                current = Some(destination);
            }

            let block = self.write_formatter.render(&table)?;
            let out = output.as_mut().unwrap();
            if write_header
                && let Some(header) = &block.header
            {
                self.write_line(out, header)?;
            }
            write_header = false;
            for line in &block.lines {
                self.write_line(out, line)?;
            }
        }

        if let Some(mut finished) = output {
            finished.flush()?;
        }
        Ok(())
    }
}

impl FlatFileAdapter {
    fn write_line(&self, out: &mut impl std::io::Write, line: &str) -> Result<()> {
        let (bytes, _, _) = self.connection.encoding.encode(line);
        out.write_all(&bytes)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

/// Explicit block cursor over one open file.
///
/// Owns the decoding reader, the header-derived schema template, and the
/// line accumulator; at end of input the remainder flushes as a final,
/// smaller block.
pub struct FileBlocks<'a> {
    reader: DecodingLineReader,
    formatter: &'a mut Box<dyn ReadFormatter>,
    converter: &'a ConvertProcessor,
    table_name: String,
    block_size: Option<usize>,
    header: Option<Table>,
    yielded_any: bool,
    done: bool,
}

impl FileBlocks<'_> {
    fn next_block(&mut self) -> Result<Option<Table>> {
        // the header line feeds the schema template, once
        if self.formatter.uses_header_line() && self.header.is_none() {
            match self.reader.next_line()? {
                Some(line) => {
                    let template = self.formatter.parse(&[line], None)?;
                    self.header = Some(template);
                }
                None => return Ok(None),
            }
        }

        let mut lines = Vec::new();
        loop {
            match self.reader.next_line()? {
                Some(line) => {
                    lines.push(line);
                    if let Some(limit) = self.block_size
                        && lines.len() >= limit
                    {
                        break;
                    }
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if lines.is_empty() {
            // header-only source still announces its schema, once
            if !self.yielded_any && let Some(template) = &self.header {
                let mut table = template.clone_schema();
                table.name = self.table_name.clone();
                return Ok(Some(table));
            }
            return Ok(None);
        }

        let mut table = self.formatter.parse(&lines, self.header.as_ref())?;
        if self.header.is_none() {
            self.header = Some(table.clone_schema());
        }
        self.converter.apply_table(&mut table)?;
        table.name = self.table_name.clone();
        debug!(rows = table.row_count(), table = %table.name, "emitting block");
        Ok(Some(table))
    }
}

impl Iterator for FileBlocks<'_> {
    type Item = Result<Table>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done && self.yielded_any {
            return None;
        }
        match self.next_block() {
            Ok(Some(table)) => {
                self.yielded_any = true;
                Some(Ok(table))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                self.yielded_any = true;
                Some(Err(err))
            }
        }
    }
}
