//! Delimited-text file adapter.

use crate::error::Result;
use crate::fields::{SharedFieldDefinitions, shared_field_definitions};
use crate::formatter::{CsvReadFormatter, CsvWriteFormatter, SharedCsvOptions, shared_csv_options};
use crate::table::Table;
use std::path::PathBuf;

use super::{Blocks, DataReader, DataWriter, FileConnection, FlatFileAdapter};

/// CSV file adapter: a [`FlatFileAdapter`] composed with the CSV formatter
/// pair. Separator, enclosure and field definitions are shared between the
/// read and write direction through one configuration handle.
pub struct CsvAdapter {
    pub file: FlatFileAdapter,
    options: SharedCsvOptions,
    field_definitions: SharedFieldDefinitions,
}

impl CsvAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let options = shared_csv_options();
        let field_definitions = shared_field_definitions();
        let file = FlatFileAdapter::new(
            FileConnection::new(path),
            Box::new(CsvReadFormatter::new(options.clone(), field_definitions.clone())),
            Box::new(CsvWriteFormatter::new(options.clone(), field_definitions.clone())),
        );
        CsvAdapter { file, options, field_definitions }
    }

    pub fn separator(&self) -> char {
        self.options.lock().unwrap().separator
    }

    pub fn set_separator(&self, separator: char) {
        self.options.lock().unwrap().separator = separator;
    }

    pub fn enclosure(&self) -> String {
        self.options.lock().unwrap().enclosure.clone()
    }

    pub fn set_enclosure(&self, enclosure: impl Into<String>) {
        self.options.lock().unwrap().enclosure = enclosure.into();
    }

    pub fn field_definitions(&self) -> SharedFieldDefinitions {
        self.field_definitions.clone()
    }
}

impl DataReader for CsvAdapter {
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

impl DataWriter for CsvAdapter {
    fn write_blocks(
        &mut self,
        blocks: &mut dyn Iterator<Item = Table>,
        delete_before: bool,
    ) -> Result<()> {
        self.file.write_blocks(blocks, delete_before)
    }
}
