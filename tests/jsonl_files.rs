use rowlink::adapter::{DataReader, JsonLinesAdapter, ReaderExt, WriterExt};
use rowlink::table::{DataType, Row, Table, Value};
use std::fs;

#[test]
fn roundtrip_preserves_typed_cells() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.jsonl");
    let mut adapter = JsonLinesAdapter::new(&path);

    let mut t = Table::new("t");
    t.add_column("name", DataType::Text);
    t.add_column("age", DataType::Integer);
    t.add_column("score", DataType::Float);
    t.add_row(Row(vec!["Anna".into(), Value::Integer(30), Value::Float(1.5)])).unwrap();
    adapter.write_table(&t, true)?;

    assert_eq!(
        fs::read_to_string(&path)?,
        "{\"name\":\"Anna\",\"age\":30,\"score\":1.5}\n"
    );

    let back = adapter.read_all()?;
    assert_eq!(back.value(0, "age"), Some(&Value::Integer(30)));
    assert_eq!(back.value(0, "score"), Some(&Value::Float(1.5)));
    Ok(())
}

#[test]
fn heterogeneous_lines_grow_the_schema() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.jsonl");
    fs::write(&path, "{\"a\":1}\n{\"a\":2,\"b\":\"x\"}\n")?;

    let mut adapter = JsonLinesAdapter::new(&path);
    let table = adapter.read_all()?;
    assert_eq!(table.column_names(), vec!["a", "b"]);
    assert_eq!(table.value(1, "b"), Some(&Value::Text("x".into())));
    Ok(())
}

#[test]
fn append_has_no_header_concern() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.jsonl");
    let mut adapter = JsonLinesAdapter::new(&path);

    let mut t = Table::new("t");
    t.add_column("a", DataType::Integer);
    t.add_row(Row(vec![Value::Integer(1)])).unwrap();
    adapter.write_table(&t, true)?;
    adapter.write_table(&t, false)?;

    assert_eq!(fs::read_to_string(&path)?, "{\"a\":1}\n{\"a\":1}\n");
    assert_eq!(adapter.count()?, 2);
    Ok(())
}
