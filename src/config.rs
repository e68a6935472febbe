//! Configuration surface
//!
//! Deserialized by the host application from whatever configuration source
//! it uses; all fields are optional and default sensibly.

use std::collections::HashMap;

use serde::Deserialize;

use crate::diff::DiffState;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Diff rendering configuration
    pub diff: DiffConfig,
}

/// Diff rendering configuration.
///
/// Templates may override any subset of states; missing states fall back to
/// the built-in defaults when the formatter is constructed. Allowed
/// placeholders: `{fieldName}`, `{oldValue}`, `{newValue}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Per-state message templates
    pub templates: HashMap<DiffState, String>,
    /// Fragment join delimiter for multiple diff results
    pub delimiter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_configuration() {
        let config: AuditConfig = serde_json::from_value(serde_json::json!({
            "diff": {
                "templates": {"updated": "{fieldName} changed"},
                "delimiter": "; "
            }
        }))
        .unwrap();

        assert_eq!(
            config.diff.templates.get(&DiffState::Updated).map(String::as_str),
            Some("{fieldName} changed")
        );
        assert!(!config.diff.templates.contains_key(&DiffState::Added));
        assert_eq!(config.diff.delimiter.as_deref(), Some("; "));
    }

    #[test]
    fn test_empty_configuration() {
        let config: AuditConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(config.diff.templates.is_empty());
        assert!(config.diff.delimiter.is_none());
    }
}
