//! Startup registration of scanned function candidates

use std::sync::Arc;

use super::{AuditFunction, FunctionRegistry, RegistryError};
use crate::diff::DiffFormatter;

/// One-shot builder that turns collaborator-scanned candidates into a frozen
/// [`FunctionRegistry`].
///
/// Any name conflict or invalid candidate aborts the whole scan; the scan is
/// not retried. After [`FunctionRegistrar::build`] the registry is read-only.
pub struct FunctionRegistrar {
    registry: FunctionRegistry,
}

impl FunctionRegistrar {
    /// Start a scan over an empty registry
    pub fn new() -> Self {
        Self {
            registry: FunctionRegistry::new(),
        }
    }

    /// Start a scan over a registry pre-seeded with the built-in `diff`
    pub fn with_builtins(formatter: DiffFormatter) -> Self {
        Self {
            registry: FunctionRegistry::standard(formatter),
        }
    }

    /// Register one candidate
    pub fn register(&mut self, function: Arc<dyn AuditFunction>) -> Result<(), RegistryError> {
        self.registry.register(function)
    }

    /// Register every candidate, failing fast on the first conflict
    pub fn register_all(
        &mut self,
        candidates: impl IntoIterator<Item = Arc<dyn AuditFunction>>,
    ) -> Result<(), RegistryError> {
        for candidate in candidates {
            self.register(candidate)?;
        }
        Ok(())
    }

    /// Finish the scan and freeze the registry
    pub fn build(self) -> Arc<FunctionRegistry> {
        log::debug!("Function registry frozen with {} functions", self.registry.len());
        Arc::new(self.registry)
    }
}

impl Default for FunctionRegistrar {
    fn default() -> Self {
        Self::new()
    }
}
