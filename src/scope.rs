//! Operation-local execution scope
//!
//! One [`ExecutionScope`] ties together the evaluation context, the diff
//! results and the evaluation errors accumulated during one logical
//! operation. The scope is an explicit context object passed along the call
//! chain; handing work to an asynchronous continuation uses [`snapshot`],
//! which yields an independent copy, so clearing one side never affects the
//! other.
//!
//! [`snapshot`]: ExecutionScope::snapshot

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::diff::DiffResult;
use crate::error::AuditError;
use crate::evaluator::{EvaluationContext, MethodIdentity};
use crate::model::Value;
use crate::registry::FunctionRegistry;

/// One evaluation point handed in by the interception collaborator: the
/// target instance, the method identity, the call arguments, the return
/// value once available, and the business error if the call failed.
#[derive(Clone)]
pub struct Invocation {
    /// The instance the intercepted method was called on
    pub target: Value,
    /// Identity of the intercepted operation
    pub method: MethodIdentity,
    /// Ordered call arguments
    pub arguments: Vec<Value>,
    /// Return value, absent before the business call completes
    pub result: Option<Value>,
    /// Business error message when the call failed
    pub error: Option<String>,
}

impl Invocation {
    /// Describe an invocation before or without a return value
    pub fn new(target: Value, method: MethodIdentity, arguments: Vec<Value>) -> Self {
        Self {
            target,
            method,
            arguments,
            result: None,
            error: None,
        }
    }

    /// Attach the business return value
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Attach the business failure message
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Default)]
struct ScopeState {
    context: Mutex<Option<EvaluationContext>>,
    diffs: Mutex<Vec<DiffResult>>,
    errors: Mutex<Vec<String>>,
}

/// State container for one logical operation.
///
/// Cloning the handle shares the same operation; [`ExecutionScope::snapshot`]
/// produces an independent copy for continuations.
#[derive(Clone)]
pub struct ExecutionScope {
    state: Arc<ScopeState>,
    started: Instant,
}

impl ExecutionScope {
    /// Open a scope for a new logical operation
    pub fn new() -> Self {
        Self {
            state: Arc::new(ScopeState::default()),
            started: Instant::now(),
        }
    }

    /// Initialize the evaluation context from an invocation if none is
    /// active yet. A detached context created by an earlier
    /// [`put_variable`](Self::put_variable) keeps its variables.
    pub fn context_for(&self, invocation: &Invocation, registry: &FunctionRegistry) {
        let mut guard = self.state.context.lock();
        match guard.as_mut() {
            Some(context) => context.initialize(
                invocation.target.clone(),
                invocation.method.clone(),
                invocation.arguments.clone(),
                registry.snapshot(),
            ),
            None => {
                log::debug!("Created evaluation context for {}", invocation.method.signature());
                *guard = Some(EvaluationContext::new(
                    invocation.target.clone(),
                    invocation.method.clone(),
                    invocation.arguments.clone(),
                    registry.snapshot(),
                ));
            }
        }
    }

    /// Whether an evaluation context is active
    pub fn has_context(&self) -> bool {
        self.state.context.lock().is_some()
    }

    /// Run a closure against the active context, or fail with
    /// [`AuditError::MissingContext`]. The context lock is held for the
    /// duration of the closure.
    pub fn with_context<R>(
        &self,
        f: impl FnOnce(&mut EvaluationContext) -> R,
    ) -> Result<R, AuditError> {
        let mut guard = self.state.context.lock();
        match guard.as_mut() {
            Some(context) => Ok(f(context)),
            None => Err(AuditError::MissingContext),
        }
    }

    /// Bind a variable in the current context, creating a detached context
    /// when none is active yet
    pub fn put_variable(&self, name: impl Into<String>, value: Value) {
        let mut guard = self.state.context.lock();
        let context = guard.get_or_insert_with(EvaluationContext::detached);
        context.set_variable(name, value);
    }

    /// Method identity of the active context, if any
    pub fn method(&self) -> Option<MethodIdentity> {
        self.state
            .context
            .lock()
            .as_ref()
            .map(|context| context.method().clone())
    }

    /// Append a diff result; multiple diff calls within one operation
    /// accumulate in call order
    pub fn record_diff(&self, result: DiffResult) {
        let mut diffs = self.state.diffs.lock();
        diffs.push(result);
        log::debug!("Recorded 1 diff result, total {}", diffs.len());
    }

    /// Everything diffed during this operation so far, in call order
    pub fn diff_results(&self) -> Vec<DiffResult> {
        self.state.diffs.lock().clone()
    }

    /// Record an expression or diff error for observability
    pub fn record_error(&self, message: impl Into<String>) {
        self.state.errors.lock().push(message.into());
    }

    /// Errors recorded during this operation so far
    pub fn errors(&self) -> Vec<String> {
        self.state.errors.lock().clone()
    }

    /// Elapsed time since the scope was opened, in milliseconds
    pub fn elapsed_millis(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Independent copy of the current state, for handing the remainder of
    /// the operation to a continuation on another worker. Later mutations or
    /// clearing on either side do not affect the other.
    pub fn snapshot(&self) -> ExecutionScope {
        let state = ScopeState {
            context: Mutex::new(self.state.context.lock().clone()),
            diffs: Mutex::new(self.state.diffs.lock().clone()),
            errors: Mutex::new(self.state.errors.lock().clone()),
        };
        ExecutionScope {
            state: Arc::new(state),
            started: self.started,
        }
    }

    /// Drop all operation state. Idempotent; must be called on every exit
    /// path of the owning operation, including aborted evaluations.
    pub fn clear(&self) {
        *self.state.context.lock() = None;
        self.state.diffs.lock().clear();
        self.state.errors.lock().clear();
        log::debug!("Cleared execution scope");
    }
}

impl Default for ExecutionScope {
    fn default() -> Self {
        Self::new()
    }
}
