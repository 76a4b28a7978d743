use rowlink::adapter::{DataReader, FixedTextAdapter, ReaderExt, WriterExt};
use rowlink::fields::{Field, FieldDefinition};
use rowlink::table::{DataType, Row, Table, Value};
use std::fs;

fn sample() -> Table {
    let mut t = Table::new("people");
    t.add_column("Name", DataType::Text);
    t.add_column("Age", DataType::Text);
    t.add_row(Row(vec!["Al".into(), "30".into()])).unwrap();
    t.add_row(Row(vec!["Alexander".into(), "7".into()])).unwrap();
    t
}

fn with_lengths(adapter: &FixedTextAdapter) {
    let defs = adapter.field_definitions();
    let mut defs = defs.lock().unwrap();
    defs.push(FieldDefinition::new(Field::with_length("Name", 5)));
    defs.push(FieldDefinition::new(Field::with_length("Age", 3)));
}

#[test]
fn write_pads_and_truncates_on_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.txt");
    let mut adapter = FixedTextAdapter::new(&path);
    with_lengths(&adapter);

    adapter.write_table(&sample(), true)?;
    assert_eq!(fs::read_to_string(&path)?, "Name Age\nAl   30 \nAlexa7  \n");
    Ok(())
}

#[test]
fn roundtrip_recovers_trimmed_values() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.txt");
    let mut adapter = FixedTextAdapter::new(&path);
    with_lengths(&adapter);

    adapter.write_table(&sample(), true)?;
    let table = adapter.read_all()?;

    assert_eq!(table.column_names(), vec!["Name", "Age"]);
    assert_eq!(table.value(0, "Name"), Some(&Value::Text("Al".into())));
    assert_eq!(table.value(1, "Name"), Some(&Value::Text("Alexa".into())));
    assert_eq!(table.value(1, "Age"), Some(&Value::Text("7".into())));
    Ok(())
}

#[test]
fn auto_detected_lengths_use_options() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.txt");
    let mut adapter = FixedTextAdapter::new(&path);
    adapter.options().lock().unwrap().default_length = 6;

    adapter.write_table(&sample(), true)?;
    assert_eq!(fs::read_to_string(&path)?, "Name  Age   \nAl    30    \nAlexan7     \n");
    Ok(())
}

#[test]
fn read_without_definitions_fails() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.txt");
    fs::write(&path, "Name Age\nAl   30 \n")?;

    let mut adapter = FixedTextAdapter::new(&path);
    let mut blocks = adapter.read_blocks(None)?;
    assert!(blocks.next().unwrap().is_err());
    Ok(())
}
