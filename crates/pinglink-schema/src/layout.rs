use std::collections::HashMap;
use std::sync::Arc;

use crate::types::FieldType;

/// A named, typed payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

/// Compiled binary layout of one message.
///
/// Built by [`compile`](crate::compile) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLayout {
    pub(crate) id: u16,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) group: String,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) fixed_size: usize,
    pub(crate) has_variable_tail: bool,
}

impl MessageLayout {
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Definition group the message came from.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Fields in wire order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Bytes taken by the fixed-size fields.
    pub fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    /// Whether the last field is the variable-length byte array.
    pub fn has_variable_tail(&self) -> bool {
        self.has_variable_tail
    }

    /// Position of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Message id → layout table. Immutable once compiled; share it behind an
/// `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SchemaTable {
    by_id: HashMap<u16, Arc<MessageLayout>>,
    by_name: HashMap<String, u16>,
}

impl SchemaTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            by_id: HashMap::with_capacity(capacity),
            by_name: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a layout, returning the one already holding its id.
    pub(crate) fn insert(&mut self, layout: MessageLayout) -> Option<Arc<MessageLayout>> {
        if let Some(existing) = self.by_id.get(&layout.id) {
            return Some(Arc::clone(existing));
        }
        self.by_name.entry(layout.name.clone()).or_insert(layout.id);
        self.by_id.insert(layout.id, Arc::new(layout));
        None
    }

    /// Layout for a message id.
    pub fn get(&self, id: u16) -> Option<&Arc<MessageLayout>> {
        self.by_id.get(&id)
    }

    /// Layout for a message name.
    pub fn by_name(&self, name: &str) -> Option<&Arc<MessageLayout>> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    pub fn contains(&self, id: u16) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Message ids, ascending.
    pub fn ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Layouts ordered by id.
    pub fn layouts(&self) -> Vec<&Arc<MessageLayout>> {
        let mut layouts: Vec<&Arc<MessageLayout>> = self.by_id.values().collect();
        layouts.sort_unstable_by_key(|l| l.id);
        layouts
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
