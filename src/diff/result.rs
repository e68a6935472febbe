//! Structured diff results

use super::state::DiffState;
use crate::model::Value;

/// One field-level difference between the old and the new object.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDiff {
    /// Field name; absent when two simple values were compared as a whole
    pub field_name: Option<String>,
    /// Optional human label overriding the field name in rendered messages
    pub title: Option<String>,
    /// Value on the old side, `Null` when the field was absent there
    pub old_value: Value,
    /// Value on the new side, `Null` when the field was absent there
    pub new_value: Value,
    /// Classification of the change
    pub state: DiffState,
}

impl FieldDiff {
    /// Create a field diff
    pub fn new(
        field_name: Option<String>,
        old_value: Value,
        new_value: Value,
        state: DiffState,
    ) -> Self {
        Self {
            field_name,
            title: None,
            old_value,
            new_value,
            state,
        }
    }

    /// Attach the human-readable label
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The label used in rendered messages: title when present, field name
    /// otherwise, empty for an unnamed simple-value comparison
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.field_name.as_deref())
            .unwrap_or("")
    }
}

/// All field differences from one diff invocation, in contract order:
/// old-object fields in declared order first, then new-only fields in
/// declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult {
    /// Type name of the old object
    pub old_type_name: String,
    /// Type name of the new object
    pub new_type_name: String,
    /// Ordered field differences
    pub fields: Vec<FieldDiff>,
}

impl DiffResult {
    /// Create an empty result for a pair of type names
    pub fn new(old_type_name: impl Into<String>, new_type_name: impl Into<String>) -> Self {
        Self {
            old_type_name: old_type_name.into(),
            new_type_name: new_type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field difference
    pub fn push(&mut self, field: FieldDiff) {
        self.fields.push(field);
    }

    /// Whether no differences were found
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
