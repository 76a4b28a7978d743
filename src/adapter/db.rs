//! Database write adapter: the provider contract and the generic adapter
//! driving it.
//!
//! The crate ships no concrete database engine; providers implement
//! [`DbClient`] and the [`DbAdapter`] supplies the block protocol on top:
//! ensure the table exists before the first block, optionally clear it,
//! then bulk-write every block in its own transaction and collect the
//! per-row rejections without stopping the stream.

use crate::convert::{ConvertDirection, ConvertProcessor};
use crate::error::{BulkWriteReport, Result};
use crate::table::{Row, Table};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::DataWriter;

/// Contract a database provider implements.
///
/// `bulk_write` must apply the whole table in one transaction; rows the
/// provider rejects individually are reported back, not raised.
pub trait DbClient {
    fn connect(&mut self) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;
    fn exists_table(&mut self, name: &str) -> Result<bool>;
    fn create_table(&mut self, table: &Table) -> Result<()>;
    fn delete_data(&mut self, name: &str) -> Result<()>;
    fn bulk_write(&mut self, table: &Table) -> Result<BulkWriteReport>;
}

/// Drives any [`DbClient`] with the streaming write protocol.
pub struct DbAdapter<C: DbClient> {
    pub client: C,
    pub write_converter: ConvertProcessor,
    connected: bool,
    /// Aggregated outcome of the last `write_blocks` call.
    last_report: BulkWriteReport,
}

impl<C: DbClient> DbAdapter<C> {
    pub fn new(client: C) -> Self {
        DbAdapter {
            client,
            write_converter: ConvertProcessor::new(ConvertDirection::Write),
            connected: false,
            last_report: BulkWriteReport::default(),
        }
    }

    pub fn last_report(&self) -> &BulkWriteReport {
        &self.last_report
    }

    pub fn disconnect(&mut self) -> Result<()> {
        if self.connected {
            self.client.disconnect()?;
            self.connected = false;
        }
        Ok(())
    }
}

impl<C: DbClient> DataWriter for DbAdapter<C> {
    fn write_blocks(
        &mut self,
        blocks: &mut dyn Iterator<Item = Table>,
        delete_before: bool,
    ) -> Result<()> {
        let mut prepared: HashSet<String> = HashSet::new();
        let mut report = BulkWriteReport::default();

        for mut table in blocks {
            self.write_converter.apply_table(&mut table)?;

            if !self.connected {
                self.client.connect()?;
                self.connected = true;
            }
            if prepared.insert(table.name.clone()) {
                let existed = self.client.exists_table(&table.name)?;
                if !existed {
                    self.client.create_table(&table)?;
                } else if delete_before {
                    self.client.delete_data(&table.name)?;
                }
                debug!(table = %table.name, existed, "prepared destination table");
            }

            let block_report = self.client.bulk_write(&table)?;
            if !block_report.is_clean() {
                warn!(
                    table = %table.name,
                    rejected = block_report.row_errors.len(),
                    "provider rejected rows in block"
                );
            }
            report.written += block_report.written;
            report.row_errors.extend(block_report.row_errors);
        }

        self.last_report = report;
        Ok(())
    }
}

/// In-memory [`DbClient`] used by the crate's own tests and as a reference
/// implementation of the contract.
#[derive(Default)]
pub struct MemoryDbClient {
    pub tables: Vec<Table>,
    /// Per-row rejection predicate: a message means the row is rejected.
    pub reject: Option<Box<dyn Fn(&Row) -> Option<String> + Send>>,
    pub connected: bool,
}

impl MemoryDbClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }
}

impl DbClient for MemoryDbClient {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn exists_table(&mut self, name: &str) -> Result<bool> {
        Ok(self.table(name).is_some())
    }

    fn create_table(&mut self, table: &Table) -> Result<()> {
        if self.table(&table.name).is_none() {
            self.tables.push(table.clone_schema());
        }
        Ok(())
    }

    fn delete_data(&mut self, name: &str) -> Result<()> {
        if let Some(table) = self.table_mut(name) {
            table.clear();
        }
        Ok(())
    }

    fn bulk_write(&mut self, table: &Table) -> Result<BulkWriteReport> {
        let mut report = BulkWriteReport::default();
        // stage first, commit at the end: one transaction per block
        let mut accepted: Vec<Row> = Vec::new();
        for (i, row) in table.rows().iter().enumerate() {
            match self.reject.as_ref().and_then(|pred| pred(row)) {
                Some(message) => {
                    report.row_errors.push(crate::error::RowError { row_index: i, message });
                }
                None => accepted.push(row.clone()),
            }
        }
        report.written = accepted.len();

        let Some(target) = self.table_mut(&table.name) else {
            return Err(crate::error::RowlinkError::Configuration(format!(
                "bulk write into unknown table '{}'",
                table.name
            )));
        };
        for row in accepted {
            target.add_row(row)?;
        }
        Ok(report)
    }
}
