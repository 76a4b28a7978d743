//! Field descriptors and source-to-table field mappings.

use crate::convert::ValueConverter;
use crate::table::DataType;
use std::sync::{Arc, Mutex};

/// A named, optionally length-constrained, optionally typed field
/// descriptor. Describes either an external column (e.g. a fixed-width
/// segment) or an internal table column.
#[derive(Debug, Clone, Default)]
pub struct Field {
    pub name: String,
    /// Character length for fixed-width segments; `None` when free-form.
    pub length: Option<usize>,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field { name: name.into(), length: None, data_type: DataType::Text }
    }

    pub fn with_length(name: impl Into<String>, length: usize) -> Self {
        Field { name: name.into(), length: Some(length), data_type: DataType::Text }
    }

    pub fn typed(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }
}

/// Pairs one external field ("data source field") with one internal table
/// field, with an activation flag, an optional value converter, and two
/// cached positional indices populated lazily on first use.
///
/// Changing length or type after a streaming session has started is
/// undefined behavior.
#[derive(Clone)]
pub struct FieldDefinition {
    pub source_field: Field,
    pub table_field: Field,
    pub is_active: bool,
    pub converter: Option<Arc<dyn ValueConverter>>,
    /// Position of the source field in the external record, cached for O(1)
    /// access after the first block.
    pub source_index: Option<usize>,
    /// Position of the table field in the table, cached likewise.
    pub table_index: Option<usize>,
}

impl FieldDefinition {
    /// Maps a source field onto a table field of the same name and shape.
    pub fn new(source_field: Field) -> Self {
        let table_field = source_field.clone();
        FieldDefinition {
            source_field,
            table_field,
            is_active: true,
            converter: None,
            source_index: None,
            table_index: None,
        }
    }

    pub fn mapped(source_field: Field, table_field: Field) -> Self {
        FieldDefinition {
            source_field,
            table_field,
            is_active: true,
            converter: None,
            source_index: None,
            table_index: None,
        }
    }

    pub fn named(source_name: impl Into<String>) -> Self {
        Self::new(Field::new(source_name))
    }

    pub fn with_converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl std::fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <-> {} ({})",
            self.source_field.name,
            self.table_field.name,
            if self.is_active { "active" } else { "inactive" }
        )
    }
}

/// Ordered collection of field definitions. Order determines column order in
/// generated tables. When the list is empty, all source columns pass through
/// unmapped; when non-empty, only active definitions participate.
#[derive(Clone, Default)]
pub struct FieldDefinitionList(pub Vec<FieldDefinition>);

impl FieldDefinitionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, definition: FieldDefinition) {
        self.0.push(definition);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDefinition> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, FieldDefinition> {
        self.0.iter_mut()
    }

    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_active).count()
    }

    /// Drops the cached positional indices, forcing re-resolution on the
    /// next block.
    pub fn reset_indices(&mut self) {
        for def in &mut self.0 {
            def.source_index = None;
            def.table_index = None;
        }
    }
}

impl std::ops::Index<usize> for FieldDefinitionList {
    type Output = FieldDefinition;

    fn index(&self, index: usize) -> &FieldDefinition {
        &self.0[index]
    }
}

/// The one explicitly shared field-definition list handed to both the read
/// and write formatter of an adapter at construction time. Both directions
/// see edits made through the adapter; nothing else aliases the list.
pub type SharedFieldDefinitions = Arc<Mutex<FieldDefinitionList>>;

pub fn shared_field_definitions() -> SharedFieldDefinitions {
    Arc::new(Mutex::new(FieldDefinitionList::new()))
}
