//! Diff classification states

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a field changed between the old and the new object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffState {
    /// Field is empty on the old side and present on the new side
    Added,
    /// Field is present on both sides with different values
    Updated,
    /// Field is present on the old side and empty on the new side
    Deleted,
}

impl fmt::Display for DiffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffState::Added => write!(f, "added"),
            DiffState::Updated => write!(f, "updated"),
            DiffState::Deleted => write!(f, "deleted"),
        }
    }
}
