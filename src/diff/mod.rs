//! Object diffing and diff message rendering
//!
//! Given an old and a new value, the engine computes field-level differences
//! classified as added, updated or deleted; the formatter renders them into
//! one message string through per-state templates. The `diff` expression
//! function ties both together and records results on the execution scope.

mod engine;
mod formatter;
mod function;
mod result;
mod state;

pub use engine::DiffEngine;
pub use formatter::DiffFormatter;
pub use function::{DIFF_FUNCTION_NAME, DiffFunction};
pub use result::{DiffResult, FieldDiff};
pub use state::DiffState;
