//! Template-based diff message rendering

use std::collections::HashMap;

use super::result::FieldDiff;
use super::state::DiffState;
use crate::config::DiffConfig;

const PLACEHOLDER_FIELD_NAME: &str = "{fieldName}";
const PLACEHOLDER_OLD_VALUE: &str = "{oldValue}";
const PLACEHOLDER_NEW_VALUE: &str = "{newValue}";

const DEFAULT_TEMPLATE_ADDED: &str = "{fieldName} added as [{newValue}]";
const DEFAULT_TEMPLATE_UPDATED: &str = "{fieldName} updated from [{oldValue}] to [{newValue}]";
const DEFAULT_TEMPLATE_DELETED: &str = "{fieldName} deleted, previously [{oldValue}]";
const DEFAULT_DELIMITER: &str = ", ";

/// Renders field differences into one message string.
///
/// Each state has a template with `{fieldName}`, `{oldValue}` and
/// `{newValue}` placeholders; fragments are joined with the delimiter.
/// Substitution is purely textual, no nested expression evaluation.
#[derive(Debug, Clone)]
pub struct DiffFormatter {
    templates: HashMap<DiffState, String>,
    delimiter: String,
}

impl Default for DiffFormatter {
    fn default() -> Self {
        Self::from_config(&DiffConfig::default())
    }
}

impl DiffFormatter {
    /// Build a formatter from configuration, filling every state not
    /// explicitly configured with its default template
    pub fn from_config(config: &DiffConfig) -> Self {
        let mut templates = config.templates.clone();
        for (state, default) in [
            (DiffState::Added, DEFAULT_TEMPLATE_ADDED),
            (DiffState::Updated, DEFAULT_TEMPLATE_UPDATED),
            (DiffState::Deleted, DEFAULT_TEMPLATE_DELETED),
        ] {
            templates.entry(state).or_insert_with(|| {
                log::debug!("No {state} template configured, using the default");
                default.to_string()
            });
        }
        let delimiter = config
            .delimiter
            .clone()
            .unwrap_or_else(|| DEFAULT_DELIMITER.to_string());
        Self {
            templates,
            delimiter,
        }
    }

    /// The template used for a state
    pub fn template(&self, state: DiffState) -> &str {
        // Every state is filled in during construction
        self.templates
            .get(&state)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// The fragment join delimiter
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Render field differences into one message; empty input renders as the
    /// empty string
    pub fn format(&self, fields: &[FieldDiff]) -> String {
        let fragments: Vec<String> = fields.iter().map(|field| self.render(field)).collect();
        fragments.join(&self.delimiter)
    }

    fn render(&self, field: &FieldDiff) -> String {
        self.template(field.state)
            .replace(PLACEHOLDER_FIELD_NAME, field.label())
            .replace(PLACEHOLDER_OLD_VALUE, &field.old_value.to_string())
            .replace(PLACEHOLDER_NEW_VALUE, &field.new_value.to_string())
    }
}
