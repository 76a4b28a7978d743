use rowlink::adapter::{CsvAdapter, DataReader, DataWriter, ReaderExt, WriterExt};
use rowlink::table::{DataType, Row, Table, Value};
use std::fs;

fn people() -> Table {
    let mut t = Table::new("people");
    t.add_column("Name", DataType::Text);
    t.add_column("Age", DataType::Text);
    t.add_row(Row(vec!["Anna".into(), "30".into()])).unwrap();
    t.add_row(Row(vec!["Ben".into(), "25".into()])).unwrap();
    t
}

#[test]
fn roundtrip_preserves_bytes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source_path = dir.path().join("in.csv");
    let copy_path = dir.path().join("out.csv");
    fs::write(&source_path, "Name;Age\nAnna;30\nBen;25\n")?;

    let mut source = CsvAdapter::new(&source_path);
    let mut target = CsvAdapter::new(&copy_path);
    let table = source.read_all()?;
    target.write_table(&table, true)?;

    assert_eq!(fs::read_to_string(&copy_path)?, "Name;Age\nAnna;30\nBen;25\n");
    Ok(())
}

#[test]
fn header_written_once_across_blocks() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    let mut adapter = CsvAdapter::new(&path);

    let mut blocks = vec![people(), people()].into_iter();
    adapter.write_blocks(&mut blocks, true)?;

    let contents = fs::read_to_string(&path)?;
    assert_eq!(contents.matches("Name;Age").count(), 1);
    assert_eq!(contents.lines().count(), 5);
    Ok(())
}

#[test]
fn append_to_existing_file_skips_header() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    let mut adapter = CsvAdapter::new(&path);

    adapter.write_table(&people(), false)?;
    adapter.write_table(&people(), false)?;

    let contents = fs::read_to_string(&path)?;
    assert_eq!(contents.matches("Name;Age").count(), 1);
    assert_eq!(contents.lines().count(), 5);
    Ok(())
}

#[test]
fn delete_before_is_idempotent() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    let mut adapter = CsvAdapter::new(&path);

    adapter.write_table(&people(), true)?;
    let mut second = Table::new("people");
    second.add_column("Name", DataType::Text);
    second.add_column("Age", DataType::Text);
    second.add_row(Row(vec!["Cara".into(), "41".into()])).unwrap();
    adapter.write_table(&second, true)?;

    // only the second write's data survives
    assert_eq!(fs::read_to_string(&path)?, "Name;Age\nCara;41\n");
    Ok(())
}

#[test]
fn custom_separator_and_enclosure_apply_both_directions() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    let mut adapter = CsvAdapter::new(&path);
    adapter.set_separator(',');
    adapter.set_enclosure("\"");

    adapter.write_table(&people(), true)?;
    assert_eq!(
        fs::read_to_string(&path)?,
        "\"Name\",\"Age\"\n\"Anna\",\"30\"\n\"Ben\",\"25\"\n"
    );

    let table = adapter.read_all()?;
    assert_eq!(table.value(0, "Name"), Some(&Value::Text("Anna".into())));
    assert_eq!(table.value(1, "Age"), Some(&Value::Text("25".into())));
    Ok(())
}

#[test]
fn count_and_available_columns() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.csv");
    fs::write(&path, "Name;Age\nAnna;30\nBen;25\n")?;

    let mut adapter = CsvAdapter::new(&path);
    assert_eq!(adapter.count()?, 2);

    let columns = adapter.available_columns()?;
    let names: Vec<&str> = columns.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Name", "Age"]);

    assert_eq!(adapter.available_tables()?, vec!["in".to_string()]);
    Ok(())
}

#[test]
fn null_cell_round_trips_as_empty_field() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    let mut adapter = CsvAdapter::new(&path);

    let mut t = Table::new("t");
    t.add_column("A", DataType::Text);
    t.add_column("B", DataType::Text);
    t.add_row(Row(vec![Value::Null, "x".into()])).unwrap();
    adapter.write_table(&t, true)?;

    assert_eq!(fs::read_to_string(&path)?, "A;B\n;x\n");
    Ok(())
}
