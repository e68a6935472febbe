//! Named function registry for audit expressions
//!
//! Business code registers helper functions once at startup; the evaluator
//! invokes them by name. Registration conflicts are fatal configuration
//! errors, raised during the startup scan rather than per call.

mod function;
mod registrar;

pub use function::{AuditFunction, ClosureFunction, FunctionError, FunctionResult};
pub use registrar::FunctionRegistrar;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::diff::{DiffFormatter, DiffFunction};

/// Errors raised while building the function registry. Startup-fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// A function with the same name is already registered
    #[error("function '{name}' is already registered")]
    DuplicateFunction {
        /// The conflicting name
        name: String,
    },

    /// The candidate is not eligible for registration
    #[error("function name '{name}' is not a valid identifier")]
    InvalidFunction {
        /// The rejected name
        name: String,
    },
}

/// Process-lifetime table of named callable functions.
///
/// Built once during startup, then shared read-only behind an `Arc`.
/// Registered callables are `Send + Sync + 'static`, which replaces the
/// original runtime "must be static" check: a function cannot smuggle in
/// borrowed per-instance state.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<String, Arc<dyn AuditFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in `diff` function
    pub fn standard(formatter: DiffFormatter) -> Self {
        let mut registry = Self::new();
        registry.insert_builtin(Arc::new(DiffFunction::new(formatter)));
        registry
    }

    /// Register a function, failing on duplicate or invalid names
    pub fn register(&mut self, function: Arc<dyn AuditFunction>) -> Result<(), RegistryError> {
        let name = function.name().to_string();
        if !is_valid_function_name(&name) {
            return Err(RegistryError::InvalidFunction { name });
        }
        if self.functions.contains_key(&name) {
            return Err(RegistryError::DuplicateFunction { name });
        }
        log::debug!("Registered function '{name}'");
        self.functions.insert(name, function);
        Ok(())
    }

    /// Look up a function by name
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn AuditFunction>> {
        self.functions.get(name).cloned()
    }

    /// Snapshot of the function table, used to seed a new evaluation context
    pub fn snapshot(&self) -> FxHashMap<String, Arc<dyn AuditFunction>> {
        self.functions.clone()
    }

    /// Registered function names, unordered
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    // Built-ins bypass name validation; their names are compile-time known.
    fn insert_builtin(&mut self, function: Arc<dyn AuditFunction>) {
        self.functions
            .insert(function.name().to_string(), function);
    }
}

fn is_valid_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
