//! Delimited-text formatting.

use crate::error::Result;
use crate::fields::SharedFieldDefinitions;
use crate::table::{DataType, Table, Value};
use std::sync::{Arc, Mutex};

use super::{ReadFormatter, RenderedBlock, WriteFormatter};

/// Separator/enclosure configuration shared between the read and write
/// formatter of one adapter.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub separator: char,
    /// Quote string wrapped around every field on write and stripped on
    /// read; empty disables enclosures.
    pub enclosure: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions { separator: ';', enclosure: String::new() }
    }
}

pub type SharedCsvOptions = Arc<Mutex<CsvOptions>>;

pub fn shared_csv_options() -> SharedCsvOptions {
    Arc::new(Mutex::new(CsvOptions::default()))
}

fn split_line(line: &str, separator: char, enclosure: &str) -> Vec<String> {
    line.split(separator)
        .map(|field| {
            if !enclosure.is_empty() {
                field
                    .strip_prefix(enclosure)
                    .and_then(|f| f.strip_suffix(enclosure))
                    .unwrap_or(field)
                    .to_string()
            } else {
                field.to_string()
            }
        })
        .collect()
}

fn build_line(fields: &[String], separator: char, enclosure: &str) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(separator);
        }
        line.push_str(enclosure);
        line.push_str(field);
        line.push_str(enclosure);
    }
    line
}

fn default_column_name(index: usize) -> String {
    format!("Column{}", index + 1)
}

/// Parses delimited lines into a table.
///
/// Without field definitions the first line (when no template is given)
/// supplies the column names and every column passes through; with active
/// definitions the mapping is positional and only active definitions
/// contribute columns.
pub struct CsvReadFormatter {
    pub options: SharedCsvOptions,
    pub field_definitions: SharedFieldDefinitions,
}

impl CsvReadFormatter {
    pub fn new(options: SharedCsvOptions, field_definitions: SharedFieldDefinitions) -> Self {
        CsvReadFormatter { options, field_definitions }
    }
}

impl ReadFormatter for CsvReadFormatter {
    fn parse(&mut self, lines: &[String], template: Option<&Table>) -> Result<Table> {
        let (separator, enclosure) = {
            let opts = self.options.lock().unwrap();
            (opts.separator, opts.enclosure.clone())
        };
        let mut defs = self.field_definitions.lock().unwrap();

        let mut table;
        let data_lines;

        if let Some(tpl) = template {
            table = tpl.clone_schema();
            data_lines = lines;
        } else {
            // first line is the header
            table = Table::new("");
            let Some((header, rest)) = lines.split_first() else {
                return Ok(table);
            };
            data_lines = rest;
            let names = split_line(header, separator, &enclosure);

            if defs.is_empty() {
                for (i, name) in names.iter().enumerate() {
                    let name = if name.trim().is_empty() {
                        default_column_name(i)
                    } else {
                        name.trim().to_string()
                    };
                    table.add_column(name, DataType::Text);
                }
            } else {
                for (i, def) in defs.iter_mut().enumerate() {
                    if !def.is_active {
                        continue;
                    }
                    def.source_index = Some(i);
                    let idx = table.add_column(def.table_field.name.clone(), def.table_field.data_type);
                    def.table_index = Some(idx);
                }
            }
        }

        for line in data_lines {
            let values = split_line(line, separator, &enclosure);
            if defs.is_empty() {
                // rows may carry more separators than the header did
                while table.columns().len() < values.len() {
                    let idx = table.columns().len();
                    table.add_column(default_column_name(idx), DataType::Text);
                }
                let mut row = table.new_row();
                for (i, v) in values.into_iter().enumerate() {
                    row.set(i, Value::Text(v));
                }
                table.add_row(row)?;
            } else {
                let mut row = table.new_row();
                for def in defs.iter() {
                    if !def.is_active {
                        continue;
                    }
                    let (Some(src), Some(dst)) = (def.source_index, def.table_index) else {
                        continue;
                    };
                    if let Some(v) = values.get(src) {
                        row.set(dst, Value::Text(v.clone()));
                    }
                }
                table.add_row(row)?;
            }
        }

        Ok(table)
    }
}

/// Renders a table as delimited lines.
///
/// Limitation, kept deliberately: field values are written verbatim — an
/// embedded separator or enclosure character is **not** escaped. Callers
/// feeding untrusted values that may contain the separator should choose a
/// separator that cannot occur in the data.
pub struct CsvWriteFormatter {
    pub options: SharedCsvOptions,
    pub field_definitions: SharedFieldDefinitions,
}

impl CsvWriteFormatter {
    pub fn new(options: SharedCsvOptions, field_definitions: SharedFieldDefinitions) -> Self {
        CsvWriteFormatter { options, field_definitions }
    }
}

impl WriteFormatter for CsvWriteFormatter {
    fn render(&mut self, table: &Table) -> Result<RenderedBlock> {
        let (separator, enclosure) = {
            let opts = self.options.lock().unwrap();
            (opts.separator, opts.enclosure.clone())
        };
        let mut defs = self.field_definitions.lock().unwrap();

        // header cells, resolving and caching the table indices once
        let header_cells: Vec<String> = if defs.is_empty() {
            table.column_names().iter().map(|s| s.to_string()).collect()
        } else {
            let mut cells = Vec::with_capacity(defs.active_count());
            for (i, def) in defs.iter_mut().enumerate() {
                if !def.is_active {
                    continue;
                }
                def.source_index = Some(i);
                def.table_index = table.column_index(&def.table_field.name);
                cells.push(def.source_field.name.clone());
            }
            cells
        };
        let header = build_line(&header_cells, separator, &enclosure);

        let mut lines = Vec::with_capacity(table.row_count());
        for row in table.rows() {
            let cells: Vec<String> = if defs.is_empty() {
                row.0.iter().map(Value::render).collect()
            } else {
                defs.iter()
                    .filter(|d| d.is_active)
                    .map(|d| {
                        d.table_index
                            .and_then(|i| row.get(i))
                            .map(Value::render)
                            .unwrap_or_default()
                    })
                    .collect()
            };
            lines.push(build_line(&cells, separator, &enclosure));
        }

        Ok(RenderedBlock { header: Some(header), lines })
    }
}
