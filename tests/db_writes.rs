use rowlink::adapter::{DataWriter, DbAdapter, DbClient, MemoryDbClient, WriterExt};
use rowlink::table::{DataType, Row, Table, Value};

fn people(names: &[&str]) -> Table {
    let mut t = Table::new("people");
    t.add_column("Name", DataType::Text);
    for name in names {
        t.add_row(Row(vec![(*name).into()])).unwrap();
    }
    t
}

#[test]
fn first_write_creates_the_table() -> anyhow::Result<()> {
    let mut adapter = DbAdapter::new(MemoryDbClient::new());
    adapter.write_table(&people(&["Anna", "Ben"]), false)?;

    let stored = adapter.client.table("people").unwrap();
    assert_eq!(stored.row_count(), 2);
    assert_eq!(stored.column_names(), vec!["Name"]);
    assert!(adapter.client.connected);
    Ok(())
}

#[test]
fn blocks_accumulate_into_one_table() -> anyhow::Result<()> {
    let mut adapter = DbAdapter::new(MemoryDbClient::new());
    let mut blocks = vec![people(&["Anna"]), people(&["Ben"]), people(&["Cara"])].into_iter();
    adapter.write_blocks(&mut blocks, false)?;

    assert_eq!(adapter.client.table("people").unwrap().row_count(), 3);
    assert_eq!(adapter.last_report().written, 3);
    Ok(())
}

#[test]
fn delete_before_clears_existing_rows_once() -> anyhow::Result<()> {
    let mut adapter = DbAdapter::new(MemoryDbClient::new());
    adapter.write_table(&people(&["Old"]), false)?;

    // a multi-block rewrite clears before the first block only
    let mut blocks = vec![people(&["Anna"]), people(&["Ben"])].into_iter();
    adapter.write_blocks(&mut blocks, true)?;

    let stored = adapter.client.table("people").unwrap();
    let names: Vec<_> = stored.rows().iter().map(|r| r.get(0).cloned().unwrap()).collect();
    assert_eq!(names, vec![Value::Text("Anna".into()), Value::Text("Ben".into())]);
    Ok(())
}

#[test]
fn rejected_rows_are_collected_not_raised() -> anyhow::Result<()> {
    let mut client = MemoryDbClient::new();
    client.reject = Some(Box::new(|row: &Row| match row.get(0) {
        Some(Value::Text(name)) if name == "Ben" => Some("duplicate key".into()),
        _ => None,
    }));

    let mut adapter = DbAdapter::new(client);
    adapter.write_table(&people(&["Anna", "Ben", "Cara"]), false)?;

    let report = adapter.last_report();
    assert_eq!(report.written, 2);
    assert_eq!(report.row_errors.len(), 1);
    assert_eq!(report.row_errors[0].row_index, 1);
    assert_eq!(report.row_errors[0].message, "duplicate key");
    assert_eq!(adapter.client.table("people").unwrap().row_count(), 2);
    Ok(())
}

#[test]
fn disconnect_releases_the_client() -> anyhow::Result<()> {
    let mut adapter = DbAdapter::new(MemoryDbClient::new());
    adapter.write_table(&people(&["Anna"]), false)?;
    adapter.disconnect()?;
    assert!(!adapter.client.connected);
    Ok(())
}

#[test]
fn memory_client_honors_the_contract_directly() -> anyhow::Result<()> {
    let mut client = MemoryDbClient::new();
    client.connect()?;
    assert!(!client.exists_table("people")?);

    client.create_table(&people(&[]))?;
    assert!(client.exists_table("people")?);

    client.bulk_write(&people(&["Anna"]))?;
    client.delete_data("people")?;
    assert_eq!(client.table("people").unwrap().row_count(), 0);
    Ok(())
}
