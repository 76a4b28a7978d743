use chrono::NaiveDate;
use rowlink::adapter::{CsvAdapter, ReaderExt, WriterExt};
use rowlink::convert::{
    BooleanAutoConverter, ConverterDefinition, DateTimeAutoConverter, DateTimeFormatConverter,
    NumberAutoConverter,
};
use rowlink::culture::LocaleService;
use rowlink::error::RowlinkError;
use rowlink::table::{DataType, Row, Table, Value};
use std::fs;
use std::sync::Arc;

#[test]
fn read_converters_type_the_cells() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.csv");
    fs::write(&path, "Active;Amount;Since\ny;1.5;2015-12-24\nno;2;2016-01-01\n")?;

    let mut adapter = CsvAdapter::new(&path);
    adapter
        .file
        .read_converter
        .add(ConverterDefinition::new("Active", Arc::new(BooleanAutoConverter::new())));
    adapter
        .file
        .read_converter
        .add(ConverterDefinition::new("Amount", Arc::new(NumberAutoConverter)));
    adapter
        .file
        .read_converter
        .add(ConverterDefinition::new("Since", Arc::new(DateTimeAutoConverter::default())));

    let table = adapter.read_all()?;
    assert_eq!(table.value(0, "Active"), Some(&Value::Boolean(true)));
    assert_eq!(table.value(1, "Active"), Some(&Value::Boolean(false)));
    assert_eq!(table.value(0, "Amount"), Some(&Value::Float(1.5)));
    let expected = NaiveDate::from_ymd_opt(2015, 12, 24)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(table.value(0, "Since"), Some(&Value::DateTime(expected)));
    Ok(())
}

#[test]
fn culture_column_drives_row_parsing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.csv");
    // German rows use day-first dates and comma decimals
    fs::write(
        &path,
        "Culture;When;Amount\nde-DE;24.12.2015;1,5\nen-US;12/24/2015;1.5\n",
    )?;

    let mut adapter = CsvAdapter::new(&path);
    let converter = &mut adapter.file.read_converter;
    converter.culture_column = Some("Culture".into());
    converter.add(ConverterDefinition::new("When", Arc::new(DateTimeAutoConverter::default())));
    converter.add(ConverterDefinition::new("Amount", Arc::new(NumberAutoConverter)));

    let table = adapter.read_all()?;
    let expected = NaiveDate::from_ymd_opt(2015, 12, 24)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(table.value(0, "When"), Some(&Value::DateTime(expected)));
    assert_eq!(table.value(1, "When"), Some(&Value::DateTime(expected)));
    assert_eq!(table.value(0, "Amount"), Some(&Value::Float(1.5)));
    assert_eq!(table.value(1, "Amount"), Some(&Value::Float(1.5)));
    Ok(())
}

#[test]
fn default_culture_applies_when_no_culture_column() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.csv");
    fs::write(&path, "Amount\n1.234,50\n")?;

    let mut adapter = CsvAdapter::new(&path);
    let locales = LocaleService::shared();
    adapter.file.read_converter.default_culture = locales.resolve("de-DE").unwrap();
    adapter
        .file
        .read_converter
        .add(ConverterDefinition::new("Amount", Arc::new(NumberAutoConverter)));

    let table = adapter.read_all()?;
    assert_eq!(table.value(0, "Amount"), Some(&Value::Float(1234.5)));
    Ok(())
}

#[test]
fn unparsable_values_pass_through_on_read() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.csv");
    fs::write(&path, "When\nnot a date\n")?;

    let mut adapter = CsvAdapter::new(&path);
    adapter
        .file
        .read_converter
        .add(ConverterDefinition::new("When", Arc::new(DateTimeAutoConverter::default())));

    let table = adapter.read_all()?;
    assert_eq!(table.value(0, "When"), Some(&Value::Text("not a date".into())));
    Ok(())
}

#[test]
fn write_converters_format_the_output() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    let mut adapter = CsvAdapter::new(&path);
    adapter.file.write_converter.add(
        ConverterDefinition::new("When", Arc::new(DateTimeFormatConverter))
            .with_parameter("%d.%m.%Y"),
    );

    let mut t = Table::new("t");
    t.add_column("When", DataType::DateTime);
    let when = NaiveDate::from_ymd_opt(2015, 12, 24)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    t.add_row(Row(vec![Value::DateTime(when)])).unwrap();
    adapter.write_table(&t, true)?;

    assert_eq!(fs::read_to_string(&path)?, "When\n24.12.2015\n");
    Ok(())
}

#[test]
fn failed_write_conversion_aborts_the_write() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    let mut adapter = CsvAdapter::new(&path);
    adapter.file.write_converter.add(
        ConverterDefinition::new("When", Arc::new(DateTimeFormatConverter))
            .with_parameter("%d.%m.%Y"),
    );

    let mut t = Table::new("t");
    t.add_column("When", DataType::DateTime);
    t.add_row(Row(vec![Value::Integer(5)])).unwrap();

    let err = adapter.write_table(&t, true).unwrap_err();
    assert!(matches!(err, RowlinkError::ConversionFailed { .. }));
    Ok(())
}
