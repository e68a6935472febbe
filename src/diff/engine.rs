//! Field-level diff computation

use indexmap::IndexMap;

use super::result::{DiffResult, FieldDiff};
use super::state::DiffState;
use crate::model::{FieldValue, ObjectRecord, Value};

/// Computes field-level differences between an old and a new value.
///
/// The engine is stateless; recording results on the execution scope is the
/// caller's concern. Field iteration order is contractual: old-object fields
/// in declared order first, then new-only fields in declared order, because
/// it determines rendered message ordering.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffEngine;

impl DiffEngine {
    /// Create a diff engine
    pub fn new() -> Self {
        Self
    }

    /// Diff two values.
    ///
    /// Absent values and diff-disabled objects yield an empty result rather
    /// than an error. When either side is a simple value the comparison is a
    /// single unnamed field; otherwise the declared fields of both objects
    /// are compared by name, skipping individually diff-disabled fields.
    pub fn diff(&self, old: &Value, new: &Value) -> DiffResult {
        let mut result = DiffResult::new(old.type_name(), new.type_name());

        if old.is_null() || new.is_null() {
            return result;
        }
        if is_diff_disabled(old) || is_diff_disabled(new) {
            log::debug!(
                "Diff disabled for {} or {}",
                old.type_name(),
                new.type_name()
            );
            return result;
        }

        match (old, new) {
            (Value::Object(old_record), Value::Object(new_record)) => {
                self.diff_objects(old_record, new_record, &mut result);
            }
            // Either side simple: compare the values as a whole
            _ => {
                if old != new {
                    result.push(FieldDiff::new(
                        None,
                        old.clone(),
                        new.clone(),
                        DiffState::Updated,
                    ));
                }
            }
        }
        result
    }

    fn diff_objects(&self, old: &ObjectRecord, new: &ObjectRecord, result: &mut DiffResult) {
        let old_fields = field_map(old);
        let new_fields = field_map(new);

        for (name, old_field) in &old_fields {
            match new_fields.get(name) {
                Some(new_field) => {
                    if let Some(state) = classify(old_field.value(), new_field.value()) {
                        let mut diff = FieldDiff::new(
                            Some((*name).to_string()),
                            old_field.value().clone(),
                            new_field.value().clone(),
                            state,
                        );
                        // Title from whichever side carries one, old preferred
                        if let Some(title) = old_field.title().or(new_field.title()) {
                            diff = diff.with_title(title);
                        }
                        log::debug!("Field {name} {state}");
                        result.push(diff);
                    }
                }
                None => {
                    if let Some(state) = classify(old_field.value(), &Value::Null) {
                        let mut diff = FieldDiff::new(
                            Some((*name).to_string()),
                            old_field.value().clone(),
                            Value::Null,
                            state,
                        );
                        if let Some(title) = old_field.title() {
                            diff = diff.with_title(title);
                        }
                        log::debug!("Field {name} {state}");
                        result.push(diff);
                    }
                }
            }
        }

        for (name, new_field) in &new_fields {
            if old_fields.contains_key(name) {
                continue;
            }
            if let Some(state) = classify(&Value::Null, new_field.value()) {
                let mut diff = FieldDiff::new(
                    Some((*name).to_string()),
                    Value::Null,
                    new_field.value().clone(),
                    state,
                );
                if let Some(title) = new_field.title() {
                    diff = diff.with_title(title);
                }
                log::debug!("Field {name} {state}");
                result.push(diff);
            }
        }
    }
}

fn is_diff_disabled(value: &Value) -> bool {
    match value {
        Value::Object(record) => record.is_diff_disabled(),
        _ => false,
    }
}

// Name-keyed field view preserving declaration order, diff-disabled fields
// excluded.
fn field_map(record: &ObjectRecord) -> IndexMap<&str, &FieldValue> {
    record
        .fields()
        .iter()
        .filter(|field| !field.is_diff_disabled())
        .map(|field| (field.name(), field))
        .collect()
}

// Classify a change, treating absent values and blank strings as equivalent.
// Returns `None` when nothing changed.
fn classify(old: &Value, new: &Value) -> Option<DiffState> {
    match (old.is_empty(), new.is_empty()) {
        (true, true) => None,
        (false, true) => Some(DiffState::Deleted),
        (true, false) => Some(DiffState::Added),
        (false, false) => (old != new).then_some(DiffState::Updated),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn profile(username: &str, age: i64, phone: &str, email: &str) -> Value {
        ObjectRecord::builder("UserProfile")
            .field("username", username)
            .field("age", age)
            .field("phone", phone)
            .field("email", email)
            .build()
            .into()
    }

    #[test]
    fn test_absent_side_yields_empty_result() {
        let engine = DiffEngine::new();
        assert!(engine.diff(&Value::Null, &profile("Jack", 22, "1", "")).is_empty());
        assert!(engine.diff(&profile("Jack", 22, "1", ""), &Value::Null).is_empty());
        assert!(engine.diff(&Value::Null, &Value::Null).is_empty());
    }

    #[test]
    fn test_simple_values_compared_as_whole() {
        let engine = DiffEngine::new();
        let result = engine.diff(&Value::from("old st"), &Value::from("new st"));
        assert_eq!(result.fields.len(), 1);
        let field = &result.fields[0];
        assert_eq!(field.field_name, None);
        assert_eq!(field.state, DiffState::Updated);
        assert_eq!(field.old_value, Value::from("old st"));
        assert_eq!(field.new_value, Value::from("new st"));

        assert!(engine.diff(&Value::Integer(7), &Value::Integer(7)).is_empty());
    }

    #[test]
    fn test_field_diff_in_declared_order() {
        let engine = DiffEngine::new();
        let old = profile("Jack", 22, "19988887777", "");
        let new = profile("Jack", 23, "", "jack@example.com");

        let result = engine.diff(&old, &new);
        assert_eq!(result.old_type_name, "UserProfile");
        assert_eq!(result.new_type_name, "UserProfile");

        let summary: Vec<(Option<&str>, DiffState)> = result
            .fields
            .iter()
            .map(|f| (f.field_name.as_deref(), f.state))
            .collect();
        assert_eq!(summary, vec![
            (Some("age"), DiffState::Updated),
            (Some("phone"), DiffState::Deleted),
            (Some("email"), DiffState::Added),
        ]);
    }

    #[test]
    fn test_blank_string_equivalent_to_absent() {
        let engine = DiffEngine::new();
        let old: Value = ObjectRecord::builder("T").field("note", "").build().into();
        let new: Value = ObjectRecord::builder("T").field("note", Value::Null).build().into();
        assert!(engine.diff(&old, &new).is_empty());
    }

    #[test]
    fn test_different_shapes_share_fields() {
        let engine = DiffEngine::new();
        let old: Value = ObjectRecord::builder("BaseUser")
            .field("username", "Jack")
            .field("legacyId", 1)
            .build()
            .into();
        let new: Value = ObjectRecord::builder("ExtendedUser")
            .field("username", "Jill")
            .field("nickname", "J")
            .build()
            .into();

        let result = engine.diff(&old, &new);
        let summary: Vec<(Option<&str>, DiffState)> = result
            .fields
            .iter()
            .map(|f| (f.field_name.as_deref(), f.state))
            .collect();
        assert_eq!(summary, vec![
            (Some("username"), DiffState::Updated),
            (Some("legacyId"), DiffState::Deleted),
            (Some("nickname"), DiffState::Added),
        ]);
    }

    #[test]
    fn test_disabled_object_and_fields_skipped() {
        let engine = DiffEngine::new();
        let disabled: Value = ObjectRecord::builder("Secret")
            .field("token", "a")
            .diff_disabled()
            .build()
            .into();
        let open: Value = ObjectRecord::builder("Secret").field("token", "b").build().into();
        assert!(engine.diff(&disabled, &open).is_empty());
        assert!(engine.diff(&open, &disabled).is_empty());

        let old: Value = ObjectRecord::builder("Account")
            .field("name", "a")
            .diff_disabled_field("secret", "x")
            .build()
            .into();
        let new: Value = ObjectRecord::builder("Account")
            .field("name", "b")
            .diff_disabled_field("secret", "y")
            .build()
            .into();
        let result = engine.diff(&old, &new);
        assert_eq!(result.fields.len(), 1);
        assert_eq!(result.fields[0].field_name.as_deref(), Some("name"));
    }

    #[test]
    fn test_title_resolution_prefers_old_side() {
        let engine = DiffEngine::new();
        let old: Value = ObjectRecord::builder("Account")
            .titled_field("balance", "Old Balance", 10)
            .build()
            .into();
        let new: Value = ObjectRecord::builder("Account")
            .titled_field("balance", "New Balance", 20)
            .build()
            .into();

        let result = engine.diff(&old, &new);
        assert_eq!(result.fields[0].label(), "Old Balance");
    }
}
