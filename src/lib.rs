//! Declarative audit records for business operations.
//!
//! Application code describes, per method, how an audit record should be
//! produced: who did it, what changed, and a human-readable message. The
//! interesting pieces live here: a small expression engine that resolves
//! textual expressions against a per-invocation context (with compilation
//! caching keyed by call-site identity), and an object-diff engine that turns
//! two object graphs into an ordered list of field-level changes rendered
//! through configurable templates. Interception, configuration loading and
//! record delivery are host concerns reachable through explicit interfaces.

pub mod ast;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod registry;
pub mod scope;

pub use config::{AuditConfig, DiffConfig};
pub use diff::{DiffEngine, DiffFormatter, DiffResult, DiffState, FieldDiff};
pub use engine::{
    AuditDirective, AuditEngine, AuditEngineBuilder, AuditPublisher, AuditRecord, OperatorProvider,
};
pub use error::{AuditError, Result};
pub use evaluator::{EvaluationContext, Evaluator, ExpressionCache, MethodIdentity};
pub use model::{FieldValue, ObjectBuilder, ObjectRecord, Value};
pub use parser::{ParseError, parse_expression};
pub use registry::{
    AuditFunction, ClosureFunction, FunctionError, FunctionRegistrar, FunctionRegistry,
    RegistryError,
};
pub use scope::{ExecutionScope, Invocation};
