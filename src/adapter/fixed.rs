//! Fixed-width text file adapter.

use crate::error::Result;
use crate::fields::{SharedFieldDefinitions, shared_field_definitions};
use crate::formatter::{
    FixedLengthReadFormatter, FixedLengthWriteFormatter, SharedFixedOptions, shared_fixed_options,
};
use crate::table::Table;
use std::path::PathBuf;

use super::{Blocks, DataReader, DataWriter, FileConnection, FlatFileAdapter};

/// Fixed-width file adapter. The field-definition list (which carries the
/// segment lengths) is shared between both directions; the options handle
/// controls the auto-detected lengths on write.
pub struct FixedTextAdapter {
    pub file: FlatFileAdapter,
    options: SharedFixedOptions,
    field_definitions: SharedFieldDefinitions,
}

impl FixedTextAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let options = shared_fixed_options();
        let field_definitions = shared_field_definitions();
        let file = FlatFileAdapter::new(
            FileConnection::new(path),
            Box::new(FixedLengthReadFormatter::new(field_definitions.clone())),
            Box::new(FixedLengthWriteFormatter::new(
                field_definitions.clone(),
                options.clone(),
            )),
        );
        FixedTextAdapter { file, options, field_definitions }
    }

    pub fn field_definitions(&self) -> SharedFieldDefinitions {
        self.field_definitions.clone()
    }

    pub fn options(&self) -> SharedFixedOptions {
        self.options.clone()
    }
}

impl DataReader for FixedTextAdapter {
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

impl DataWriter for FixedTextAdapter {
    fn write_blocks(
        &mut self,
        blocks: &mut dyn Iterator<Item = Table>,
        delete_before: bool,
    ) -> Result<()> {
        self.file.write_blocks(blocks, delete_before)
    }
}
