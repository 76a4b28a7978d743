//! JSON-lines formatting: one JSON object per line, keys are column names.
//! There is no header line; the schema grows as new keys appear.

use crate::error::Result;
use crate::table::{DataType, Table, Value};
use serde_json::{Map, Number, Value as Json};

use super::{ReadFormatter, RenderedBlock, WriteFormatter};

fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::Text(s.clone()),
        // nested structures stay as their JSON text
        other => Value::Text(other.to_string()),
    }
}

fn json_data_type(json: &Json) -> DataType {
    match json {
        Json::Bool(_) => DataType::Boolean,
        Json::Number(n) if n.is_i64() => DataType::Integer,
        Json::Number(_) => DataType::Float,
        _ => DataType::Text,
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        other => Json::String(other.render()),
    }
}

/// Parses JSON-lines into a table. Keys unseen so far become new columns;
/// keys absent from a line leave the cell Null.
#[derive(Default)]
pub struct JsonLinesReadFormatter;

impl JsonLinesReadFormatter {
    pub fn new() -> Self {
        JsonLinesReadFormatter
    }
}

impl ReadFormatter for JsonLinesReadFormatter {
    fn parse(&mut self, lines: &[String], template: Option<&Table>) -> Result<Table> {
        let mut table = match template {
            Some(tpl) => tpl.clone_schema(),
            None => Table::new(""),
        };

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let json: Json = serde_json::from_str(line)?;
            let Json::Object(object) = json else {
                continue;
            };
            for (key, val) in &object {
                if table.column_index(key).is_none() {
                    table.add_column(key.clone(), json_data_type(val));
                    // pad rows parsed before this key appeared
                    for row in table.rows_mut() {
                        row.0.push(Value::Null);
                    }
                }
            }
            let mut row = table.new_row();
            for (key, val) in &object {
                if let Some(idx) = table.column_index(key) {
                    row.set(idx, json_to_value(val));
                }
            }
            table.add_row(row)?;
        }

        Ok(table)
    }

    fn uses_header_line(&self) -> bool {
        false
    }
}

/// Renders each row as one JSON object line. Null cells are omitted from
/// the object.
#[derive(Default)]
pub struct JsonLinesWriteFormatter;

impl JsonLinesWriteFormatter {
    pub fn new() -> Self {
        JsonLinesWriteFormatter
    }
}

impl WriteFormatter for JsonLinesWriteFormatter {
    fn render(&mut self, table: &Table) -> Result<RenderedBlock> {
        let mut lines = Vec::with_capacity(table.row_count());
        for row in table.rows() {
            let mut object = Map::new();
            for (i, column) in table.columns().iter().enumerate() {
                match row.get(i) {
                    Some(Value::Null) | None => {}
                    Some(v) => {
                        object.insert(column.name.clone(), value_to_json(v));
                    }
                }
            }
            lines.push(serde_json::to_string(&Json::Object(object))?);
        }
        Ok(RenderedBlock { header: None, lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    #[test]
    fn schema_grows_with_new_keys() {
        let mut read = JsonLinesReadFormatter::new();
        let lines = vec![
            r#"{"name":"Anna","age":30}"#.to_string(),
            r#"{"name":"Ben","city":"Bonn"}"#.to_string(),
        ];
        let t = read.parse(&lines, None).unwrap();
        assert_eq!(t.column_names(), vec!["name", "age", "city"]);
        assert_eq!(t.value(0, "city"), Some(&Value::Null));
        assert_eq!(t.value(1, "age"), Some(&Value::Null));
        assert_eq!(t.value(1, "city"), Some(&Value::Text("Bonn".into())));
        assert!(t.rows().iter().all(|r| r.len() == t.columns().len()));
    }

    #[test]
    fn json_types_map_to_data_types() {
        let mut read = JsonLinesReadFormatter::new();
        let lines = vec![r#"{"n":1,"f":1.5,"b":true,"s":"x","z":null}"#.to_string()];
        let t = read.parse(&lines, None).unwrap();
        assert_eq!(t.value(0, "n"), Some(&Value::Integer(1)));
        assert_eq!(t.value(0, "f"), Some(&Value::Float(1.5)));
        assert_eq!(t.value(0, "b"), Some(&Value::Boolean(true)));
        assert_eq!(t.value(0, "z"), Some(&Value::Null));
    }

    #[test]
    fn write_omits_null_cells_and_has_no_header() {
        let mut write = JsonLinesWriteFormatter::new();
        let mut t = Table::new("t");
        t.add_column("name", DataType::Text);
        t.add_column("age", DataType::Integer);
        t.add_row(Row(vec!["Anna".into(), Value::Integer(30)])).unwrap();
        t.add_row(Row(vec!["Ben".into(), Value::Null])).unwrap();

        let block = write.render(&t).unwrap();
        assert_eq!(block.header, None);
        assert_eq!(
            block.lines,
            vec![
                r#"{"name":"Anna","age":30}"#.to_string(),
                r#"{"name":"Ben"}"#.to_string(),
            ]
        );
    }
}
