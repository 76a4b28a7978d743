//! Typed record mapping.
//!
//! A [`RecordMapping`] binds table columns to getter/setter closures over a
//! record type, declared explicitly with a builder. No field is mapped
//! unless named here; columns a table carries but the mapping does not know
//! are silently skipped.
//!
//! ```
//! use rowlink::mapping::RecordMapping;
//! use rowlink::table::{DataType, Value};
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     age: Option<i64>,
//! }
//!
//! let mapping = RecordMapping::<Person>::new()
//!     .field(
//!         "Name",
//!         |p| Value::Text(p.name.clone()),
//!         |p, v| p.name = v.as_str().unwrap_or_default().to_string(),
//!     )
//!     .required()
//!     .field("Age", |p| match p.age {
//!         Some(age) => Value::Integer(age),
//!         None => Value::Null,
//!     }, |p, v| p.age = v.as_i64())
//!     .typed(DataType::Integer);
//! ```

use crate::convert::ValueConverter;
use crate::culture::Culture;
use crate::error::{Result, RowlinkError};
use crate::table::{DataType, Row, Table, Value};
use std::sync::Arc;

type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, &Value) + Send + Sync>;

/// One column-to-field binding.
pub struct FieldBinding<T> {
    pub column: String,
    pub data_type: DataType,
    pub required: bool,
    get: Getter<T>,
    set: Setter<T>,
    converter: Option<Arc<dyn ValueConverter>>,
    parameter: Option<String>,
}

/// Explicit column/field mapping for a record type `T`.
pub struct RecordMapping<T> {
    bindings: Vec<FieldBinding<T>>,
}

impl<T: Default> RecordMapping<T> {
    pub fn new() -> Self {
        RecordMapping { bindings: Vec::new() }
    }

    /// Adds a binding; the builder modifiers ([`required`](Self::required),
    /// [`typed`](Self::typed), [`with_converter`](Self::with_converter))
    /// apply to the binding added last.
    pub fn field(
        mut self,
        column: impl Into<String>,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        set: impl Fn(&mut T, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.bindings.push(FieldBinding {
            column: column.into(),
            data_type: DataType::Text,
            required: false,
            get: Box::new(get),
            set: Box::new(set),
            converter: None,
            parameter: None,
        });
        self
    }

    /// Marks the last binding as required: a null after conversion aborts
    /// that record with [`RowlinkError::RequiredFieldNull`].
    pub fn required(mut self) -> Self {
        if let Some(binding) = self.bindings.last_mut() {
            binding.required = true;
        }
        self
    }

    pub fn typed(mut self, data_type: DataType) -> Self {
        if let Some(binding) = self.bindings.last_mut() {
            binding.data_type = data_type;
        }
        self
    }

    pub fn with_converter(
        mut self,
        converter: Arc<dyn ValueConverter>,
        parameter: Option<&str>,
    ) -> Self {
        if let Some(binding) = self.bindings.last_mut() {
            binding.converter = Some(converter);
            binding.parameter = parameter.map(str::to_string);
        }
        self
    }

    pub fn bindings(&self) -> &[FieldBinding<T>] {
        &self.bindings
    }

    /// Schema table with one column per binding, in declaration order.
    pub fn schema(&self, name: &str) -> Table {
        let mut table = Table::new(name);
        for binding in &self.bindings {
            table.add_column(binding.column.clone(), binding.data_type);
        }
        table
    }

    /// Builds one record from a row. Columns the table lacks leave the
    /// record's default in place unless the binding is required.
    pub fn from_row(&self, table: &Table, row: &Row, culture: &Culture) -> Result<T> {
        let mut record = T::default();
        for binding in &self.bindings {
            let mut value = table
                .column_index(&binding.column)
                .and_then(|idx| row.get(idx).cloned())
                .unwrap_or(Value::Null);
            if let Some(converter) = &binding.converter {
                value = converter.convert(
                    value,
                    Some(binding.data_type),
                    binding.parameter.as_deref(),
                    culture,
                );
            }
            if binding.required && value.is_null() {
                return Err(RowlinkError::RequiredFieldNull { field: binding.column.clone() });
            }
            (binding.set)(&mut record, &value);
        }
        Ok(record)
    }

    /// Renders one record as a row aligned with `table`'s columns; bindings
    /// without a matching column are dropped, unbound columns stay null.
    pub fn to_row(&self, table: &Table, record: &T) -> Row {
        let mut row = table.new_row();
        for binding in &self.bindings {
            if let Some(idx) = table.column_index(&binding.column) {
                row.set(idx, (binding.get)(record));
            }
        }
        row
    }
}

impl<T: Default> Default for RecordMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}
