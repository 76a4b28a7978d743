use crate::culture::{Culture, LocaleService};
use crate::error::Result;
use crate::table::{Row, Table, Value};
use std::sync::Arc;
use tracing::trace;

use super::ValueConverter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertDirection {
    Read,
    Write,
}

/// Binds a field name to a converter instance and an arbitrary converter
/// parameter (e.g. a date format string).
#[derive(Clone)]
pub struct ConverterDefinition {
    pub field_name: String,
    pub converter: Arc<dyn ValueConverter>,
    pub parameter: Option<String>,
}

impl ConverterDefinition {
    pub fn new(field_name: impl Into<String>, converter: Arc<dyn ValueConverter>) -> Self {
        ConverterDefinition { field_name: field_name.into(), converter, parameter: None }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }
}

/// Applies a set of per-field converters across a table's rows,
/// direction-aware.
///
/// The effective culture for each row is resolved as: the designated
/// culture column's value (parsed as a 5/3/2-letter culture token), else
/// the configured default culture, else the invariant culture. Converters
/// apply in registration order; several definitions may target the same
/// field and chain.
pub struct ConvertProcessor {
    direction: ConvertDirection,
    pub definitions: Vec<ConverterDefinition>,
    pub culture_column: Option<String>,
    pub default_culture: Culture,
    locales: Arc<LocaleService>,
}

impl ConvertProcessor {
    pub fn new(direction: ConvertDirection) -> Self {
        ConvertProcessor {
            direction,
            definitions: Vec::new(),
            culture_column: None,
            default_culture: Culture::invariant(),
            locales: LocaleService::shared(),
        }
    }

    pub fn with_locales(direction: ConvertDirection, locales: Arc<LocaleService>) -> Self {
        ConvertProcessor {
            direction,
            definitions: Vec::new(),
            culture_column: None,
            default_culture: Culture::invariant(),
            locales,
        }
    }

    pub fn direction(&self) -> ConvertDirection {
        self.direction
    }

    pub fn add(&mut self, definition: ConverterDefinition) -> &mut Self {
        self.definitions.push(definition);
        self
    }

    pub fn locales(&self) -> &Arc<LocaleService> {
        &self.locales
    }

    /// Converts every row in place. Read direction never fails; write
    /// direction propagates the first `ConversionFailed`.
    pub fn apply_table(&self, table: &mut Table) -> Result<()> {
        if self.definitions.is_empty() {
            return Ok(());
        }

        // resolve field names to column indices once per table
        let targets: Vec<Option<usize>> = self
            .definitions
            .iter()
            .map(|d| table.column_index(&d.field_name))
            .collect();
        let types: Vec<_> = self
            .definitions
            .iter()
            .map(|d| {
                table
                    .column_index(&d.field_name)
                    .map(|i| table.columns()[i].data_type)
            })
            .collect();
        let culture_col = self
            .culture_column
            .as_deref()
            .and_then(|name| table.column_index(name));

        for row in table.rows_mut() {
            self.apply_row_indexed(row, &targets, &types, culture_col)?;
        }
        Ok(())
    }

    fn apply_row_indexed(
        &self,
        row: &mut Row,
        targets: &[Option<usize>],
        types: &[Option<crate::table::DataType>],
        culture_col: Option<usize>,
    ) -> Result<()> {
        let culture = self.resolve_culture(row, culture_col);

        for (i, def) in self.definitions.iter().enumerate() {
            let Some(col) = targets[i] else { continue };
            let Some(current) = row.get(col).cloned() else { continue };

            let converted = match self.direction {
                ConvertDirection::Read => Ok(def.converter.convert(
                    current,
                    types[i],
                    def.parameter.as_deref(),
                    &culture,
                )),
                ConvertDirection::Write => def.converter.convert_back(
                    current,
                    types[i],
                    def.parameter.as_deref(),
                    &culture,
                ),
            }?;
            row.set(col, converted);
        }
        Ok(())
    }

    fn resolve_culture(&self, row: &Row, culture_col: Option<usize>) -> Culture {
        if let Some(col) = culture_col
            && let Some(Value::Text(token)) = row.get(col)
            && !token.trim().is_empty()
        {
            if let Some(culture) = self.locales.resolve(token) {
                trace!(token, culture = culture.name(), "resolved row culture");
                return culture;
            }
        }
        self.default_culture.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{BooleanAutoConverter, NumberAutoConverter};
    use crate::table::{DataType, Row, Table};

    fn sample_table() -> Table {
        let mut t = Table::new("t");
        t.add_column("Flag", DataType::Boolean);
        t.add_column("Amount", DataType::Float);
        t.add_column("Culture", DataType::Text);
        t.add_row(Row(vec!["y".into(), "1,5".into(), "DE".into()])).unwrap();
        t.add_row(Row(vec!["no".into(), "2.5".into(), Value::Null])).unwrap();
        t
    }

    #[test]
    fn culture_column_wins_over_default() {
        let mut proc = ConvertProcessor::new(ConvertDirection::Read);
        proc.culture_column = Some("Culture".into());
        // default is invariant (dot decimal); row 1 carries "DE" (comma)
        proc.add(ConverterDefinition::new("Amount", Arc::new(NumberAutoConverter)));
        proc.add(ConverterDefinition::new("Flag", Arc::new(BooleanAutoConverter::new())));

        let mut table = sample_table();
        proc.apply_table(&mut table).unwrap();

        assert_eq!(table.value(0, "Amount"), Some(&Value::Float(1.5)));
        assert_eq!(table.value(1, "Amount"), Some(&Value::Float(2.5)));
        assert_eq!(table.value(0, "Flag"), Some(&Value::Boolean(true)));
        assert_eq!(table.value(1, "Flag"), Some(&Value::Boolean(false)));
    }

    #[test]
    fn empty_culture_column_falls_back_to_default() {
        let locales = LocaleService::shared();
        let mut proc = ConvertProcessor::with_locales(ConvertDirection::Read, locales.clone());
        proc.culture_column = Some("Culture".into());
        proc.default_culture = locales.resolve("de-DE").unwrap();
        proc.add(ConverterDefinition::new("Amount", Arc::new(NumberAutoConverter)));

        let mut table = Table::new("t");
        table.add_column("Amount", DataType::Float);
        table.add_column("Culture", DataType::Text);
        table.add_row(Row(vec!["3,25".into(), "".into()])).unwrap();
        proc.apply_table(&mut table).unwrap();

        assert_eq!(table.value(0, "Amount"), Some(&Value::Float(3.25)));
    }

    #[test]
    fn converters_chain_in_registration_order() {
        struct Suffix(&'static str);
        impl ValueConverter for Suffix {
            fn convert(
                &self,
                value: Value,
                _t: Option<DataType>,
                _p: Option<&str>,
                _c: &Culture,
            ) -> Value {
                match value {
                    Value::Text(s) => Value::Text(format!("{s}{}", self.0)),
                    other => other,
                }
            }
        }

        let mut proc = ConvertProcessor::new(ConvertDirection::Read);
        proc.add(ConverterDefinition::new("A", Arc::new(Suffix("-1"))));
        proc.add(ConverterDefinition::new("A", Arc::new(Suffix("-2"))));

        let mut table = Table::new("t");
        table.add_column("A", DataType::Text);
        table.add_row(Row(vec!["x".into()])).unwrap();
        proc.apply_table(&mut table).unwrap();

        assert_eq!(table.value(0, "A"), Some(&Value::Text("x-1-2".into())));
    }
}
