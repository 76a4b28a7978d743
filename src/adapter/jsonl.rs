//! JSON-lines file adapter.

use crate::error::Result;
use crate::formatter::{JsonLinesReadFormatter, JsonLinesWriteFormatter};
use crate::table::Table;
use std::path::PathBuf;

use super::{Blocks, DataReader, DataWriter, FileConnection, FlatFileAdapter};

/// JSON-lines file adapter: one JSON object per line, no header line.
pub struct JsonLinesAdapter {
    pub file: FlatFileAdapter,
}

impl JsonLinesAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let file = FlatFileAdapter::new(
            FileConnection::new(path),
            Box::new(JsonLinesReadFormatter::new()),
            Box::new(JsonLinesWriteFormatter::new()),
        );
        JsonLinesAdapter { file }
    }
}

impl DataReader for JsonLinesAdapter {
    fn read_blocks(&mut self, block_size: Option<usize>) -> Result<Blocks<'_>> {
        self.file.read_blocks(block_size)
    }

    fn count(&mut self) -> Result<usize> {
        self.file.count()
    }

    fn available_columns(&mut self) -> Result<Vec<crate::fields::Field>> {
        self.file.available_columns()
    }

    fn available_tables(&mut self) -> Result<Vec<String>> {
        self.file.available_tables()
    }
}

impl DataWriter for JsonLinesAdapter {
    fn write_blocks(
        &mut self,
        blocks: &mut dyn Iterator<Item = Table>,
        delete_before: bool,
    ) -> Result<()> {
        self.file.write_blocks(blocks, delete_before)
    }
}
