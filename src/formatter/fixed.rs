//! Fixed-width text formatting.
//!
//! Every active field definition carries a character length; write pads the
//! value right with spaces and truncates at the defined length, read slices
//! each line at the cumulative offsets derived from the same definitions.

use crate::error::{Result, RowlinkError};
use crate::fields::{Field, FieldDefinition, SharedFieldDefinitions};
use crate::table::{DataType, Table, Value};
use std::sync::{Arc, Mutex};

use super::{ReadFormatter, RenderedBlock, WriteFormatter};

/// Auto-detected field lengths used when no definitions are configured.
/// The 32/16 defaults come from typical flat-file layouts; override them
/// when the destination dictates other widths.
#[derive(Debug, Clone)]
pub struct FixedOptions {
    pub default_length: usize,
    pub decimal_length: usize,
}

impl Default for FixedOptions {
    fn default() -> Self {
        FixedOptions { default_length: 32, decimal_length: 16 }
    }
}

pub type SharedFixedOptions = Arc<Mutex<FixedOptions>>;

pub fn shared_fixed_options() -> SharedFixedOptions {
    Arc::new(Mutex::new(FixedOptions::default()))
}

fn pad_truncate(value: &str, length: usize) -> String {
    let mut out: String = value.chars().take(length).collect();
    let chars = out.chars().count();
    for _ in chars..length {
        out.push(' ');
    }
    out
}

fn slice_chars(line: &str, start: usize, length: usize) -> String {
    line.chars().skip(start).take(length).collect()
}

fn active_lengths(defs: &crate::fields::FieldDefinitionList) -> Result<Vec<(String, usize)>> {
    let mut out = Vec::with_capacity(defs.active_count());
    for def in defs.iter() {
        if !def.is_active {
            continue;
        }
        let Some(length) = def.source_field.length else {
            return Err(RowlinkError::Configuration(format!(
                "fixed-width field '{}' has no length",
                def.source_field.name
            )));
        };
        out.push((def.table_field.name.clone(), length));
    }
    Ok(out)
}

/// Slices fixed-width lines into a table. Requires a non-empty field
/// definition list; lengths cannot be inferred from raw lines.
pub struct FixedLengthReadFormatter {
    pub field_definitions: SharedFieldDefinitions,
}

impl FixedLengthReadFormatter {
    pub fn new(field_definitions: SharedFieldDefinitions) -> Self {
        FixedLengthReadFormatter { field_definitions }
    }
}

impl ReadFormatter for FixedLengthReadFormatter {
    fn parse(&mut self, lines: &[String], template: Option<&Table>) -> Result<Table> {
        let defs = self.field_definitions.lock().unwrap();
        if defs.is_empty() {
            return Err(RowlinkError::Configuration(
                "fixed-width read requires field definitions".into(),
            ));
        }
        let segments = active_lengths(&defs)?;

        let mut table;
        let data_lines;

        if let Some(tpl) = template {
            table = tpl.clone_schema();
            data_lines = lines;
        } else {
            table = Table::new("");
            let Some((header, rest)) = lines.split_first() else {
                return Ok(table);
            };
            data_lines = rest;
            let mut offset = 0;
            for (i, (def_name, length)) in segments.iter().enumerate() {
                let sliced = slice_chars(header, offset, *length);
                let name = match sliced.trim() {
                    "" if def_name.is_empty() => format!("Column{}", i + 1),
                    "" => def_name.clone(),
                    trimmed => trimmed.to_string(),
                };
                table.add_column(name, DataType::Text);
                offset += length;
            }
        }

        for line in data_lines {
            let mut row = table.new_row();
            let mut offset = 0;
            for (i, (_, length)) in segments.iter().enumerate() {
                let value = slice_chars(line, offset, *length);
                row.set(i, Value::Text(value.trim_end().to_string()));
                offset += length;
            }
            table.add_row(row)?;
        }

        Ok(table)
    }
}

/// Renders a table as fixed-width lines.
pub struct FixedLengthWriteFormatter {
    pub field_definitions: SharedFieldDefinitions,
    pub options: SharedFixedOptions,
}

impl FixedLengthWriteFormatter {
    pub fn new(field_definitions: SharedFieldDefinitions, options: SharedFixedOptions) -> Self {
        FixedLengthWriteFormatter { field_definitions, options }
    }

    fn auto_detect(&self, table: &Table) {
        let opts = self.options.lock().unwrap();
        let mut defs = self.field_definitions.lock().unwrap();
        for column in table.columns() {
            let length = match column.data_type {
                DataType::Float => opts.decimal_length,
                _ => opts.default_length,
            };
            let field = Field::with_length(column.name.clone(), length).typed(column.data_type);
            defs.push(FieldDefinition::new(field));
        }
    }
}

impl WriteFormatter for FixedLengthWriteFormatter {
    fn render(&mut self, table: &Table) -> Result<RenderedBlock> {
        if self.field_definitions.lock().unwrap().is_empty() {
            self.auto_detect(table);
        }
        let defs = self.field_definitions.lock().unwrap();
        let segments = active_lengths(&defs)?;

        let mut header = String::new();
        for (name, length) in &segments {
            header.push_str(&pad_truncate(name, *length));
        }

        let mut lines = Vec::with_capacity(table.row_count());
        for row in table.rows() {
            let mut line = String::new();
            for (i, (_, length)) in segments.iter().enumerate() {
                let rendered = row.get(i).map(Value::render).unwrap_or_default();
                line.push_str(&pad_truncate(&rendered, *length));
            }
            lines.push(line);
        }

        Ok(RenderedBlock { header: Some(header), lines })
    }
}
