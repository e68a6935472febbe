//! Crate-level error taxonomy

use thiserror::Error;

use crate::evaluator::EvaluationError;
use crate::parser::ParseError;
use crate::registry::RegistryError;

/// Result type for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Top-level error for the audit core.
///
/// Registry errors are startup-fatal; compile and evaluation errors are
/// per-call and recovered at the evaluation boundary by falling back to the
/// literal expression text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuditError {
    /// Function registration failed during the startup scan
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Expression text could not be compiled; never cached, retried next call
    #[error("expression compile error: {0}")]
    Compile(#[from] ParseError),

    /// Expression evaluation failed against the current context
    #[error("expression evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Evaluation was attempted without an initialized context
    #[error("no evaluation context is active for the current operation")]
    MissingContext,
}
