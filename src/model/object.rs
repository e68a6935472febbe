//! Explicit per-type field descriptors for composite objects
//!
//! The diff engine never introspects live business types; callers describe an
//! object once as an ordered list of field descriptors. Declaration order is
//! contractual: it determines diff and message ordering.

use super::value::Value;

/// A composite object: type name, ordered fields, and diff opt-out flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    type_name: String,
    diff_disabled: bool,
    fields: Vec<FieldValue>,
}

/// One field of an [`ObjectRecord`]: name, optional human title, value, and
/// a per-field diff opt-out.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    name: String,
    title: Option<String>,
    diff_disabled: bool,
    value: Value,
}

impl ObjectRecord {
    /// Start building an object with the given type name
    pub fn builder(type_name: impl Into<String>) -> ObjectBuilder {
        ObjectBuilder {
            type_name: type_name.into(),
            diff_disabled: false,
            fields: Vec::new(),
        }
    }

    /// The object's type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether diffing is disabled for the whole object
    pub fn is_diff_disabled(&self) -> bool {
        self.diff_disabled
    }

    /// All fields in declaration order, including diff-disabled ones
    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl FieldValue {
    /// The field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional human-readable label overriding the field name in messages
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Whether this field is excluded from diffing
    pub fn is_diff_disabled(&self) -> bool {
        self.diff_disabled
    }

    /// The field value
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Builder for [`ObjectRecord`]; fields keep their insertion order.
#[derive(Debug)]
pub struct ObjectBuilder {
    type_name: String,
    diff_disabled: bool,
    fields: Vec<FieldValue>,
}

impl ObjectBuilder {
    /// Add a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(FieldValue {
            name: name.into(),
            title: None,
            diff_disabled: false,
            value: value.into(),
        });
        self
    }

    /// Add a field with a human-readable title
    pub fn titled_field(
        mut self,
        name: impl Into<String>,
        title: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.fields.push(FieldValue {
            name: name.into(),
            title: Some(title.into()),
            diff_disabled: false,
            value: value.into(),
        });
        self
    }

    /// Add a field that the diff engine must skip
    pub fn diff_disabled_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(FieldValue {
            name: name.into(),
            title: None,
            diff_disabled: true,
            value: value.into(),
        });
        self
    }

    /// Mark the whole object as excluded from diffing
    pub fn diff_disabled(mut self) -> Self {
        self.diff_disabled = true;
        self
    }

    /// Finish building
    pub fn build(self) -> ObjectRecord {
        ObjectRecord {
            type_name: self.type_name,
            diff_disabled: self.diff_disabled,
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_declaration_order() {
        let record = ObjectRecord::builder("UserProfile")
            .field("username", "Jack")
            .field("age", 22)
            .field("phone", "123456")
            .build();

        let names: Vec<&str> = record.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["username", "age", "phone"]);
        assert_eq!(record.type_name(), "UserProfile");
        assert!(!record.is_diff_disabled());
    }

    #[test]
    fn test_field_flags() {
        let record = ObjectRecord::builder("Account")
            .titled_field("balance", "Balance", 10)
            .diff_disabled_field("secret", "s3cr3t")
            .diff_disabled()
            .build();

        assert!(record.is_diff_disabled());
        assert_eq!(record.field("balance").and_then(|f| f.title()), Some("Balance"));
        assert!(record.field("secret").is_some_and(|f| f.is_diff_disabled()));
    }
}
