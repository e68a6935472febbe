//! Audit record assembly
//!
//! The interception collaborator supplies an [`Invocation`] before or after
//! the business call; [`AuditEngine::observe`] resolves the directive's
//! declared expressions against the execution scope, assembles an
//! [`AuditRecord`], hands it to the configured publisher, and clears the
//! scope. The business outcome is never suppressed here; it is only
//! observed for the success flag.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::AuditConfig;
use crate::diff::{DiffFormatter, DiffResult};
use crate::evaluator::{Evaluator, RESULT_VARIABLE};
use crate::model::Value;
use crate::registry::{AuditFunction, FunctionRegistry, RegistryError};
use crate::scope::{ExecutionScope, Invocation};

/// Declarative description of what to record for one audited operation.
///
/// The message is the only required field; everything else defaults to
/// empty text meaning "no value". All string fields are expression text
/// resolved at observation time.
#[derive(Debug, Clone)]
pub struct AuditDirective {
    /// Gate expression; anything but `"true"` suppresses the record
    pub condition: String,
    /// Human-readable message expression
    pub message: String,
    /// Operator id expression; blank falls back to the operator provider
    pub operator_id: String,
    /// Business id expression
    pub business_id: String,
    /// Category expression
    pub category: String,
    /// Tag expression
    pub tag: String,
    /// Additional information expression
    pub additional: String,
    /// Resolve expressions before the business call instead of after
    pub prelude: bool,
    /// Bind the return value as `#result` (ignored when `prelude` is set)
    pub returning: bool,
}

impl AuditDirective {
    /// Create a directive with the given message expression
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            condition: "true".to_string(),
            message: message.into(),
            operator_id: String::new(),
            business_id: String::new(),
            category: String::new(),
            tag: String::new(),
            additional: String::new(),
            prelude: false,
            returning: true,
        }
    }

    /// Set the gate condition expression
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    /// Set the operator id expression
    pub fn operator_id(mut self, operator_id: impl Into<String>) -> Self {
        self.operator_id = operator_id.into();
        self
    }

    /// Set the business id expression
    pub fn business_id(mut self, business_id: impl Into<String>) -> Self {
        self.business_id = business_id.into();
        self
    }

    /// Set the category expression
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the tag expression
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the additional information expression
    pub fn additional(mut self, additional: impl Into<String>) -> Self {
        self.additional = additional.into();
        self
    }

    /// Resolve expressions before the business call runs
    pub fn prelude(mut self, prelude: bool) -> Self {
        self.prelude = prelude;
        self
    }

    /// Whether to bind the return value as `#result`
    pub fn returning(mut self, returning: bool) -> Self {
        self.returning = returning;
        self
    }
}

/// The finished audit record handed to the publisher.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    /// Generated record id
    pub id: String,
    /// Resolved message
    pub message: String,
    /// Whether the operation succeeded and all expressions resolved
    pub success: bool,
    /// Resolved or provider-supplied operator id
    pub operator_id: String,
    /// Resolved business id
    pub business_id: String,
    /// Resolved category
    pub category: String,
    /// Resolved tag
    pub tag: String,
    /// Resolved additional information
    pub additional: String,
    /// Observation timestamp
    pub created_at: DateTime<Utc>,
    /// Milliseconds since the execution scope was opened
    pub elapsed_millis: u64,
    /// Business and expression errors, in occurrence order
    pub errors: Vec<String>,
    /// Everything diffed during the operation, in call order
    pub diffs: Vec<DiffResult>,
}

/// Supplies the current operator identity when a directive's `operator_id`
/// expression is blank.
pub trait OperatorProvider: Send + Sync {
    /// The current operator id, if one can be determined
    fn current_operator_id(&self) -> Option<String>;
}

/// Outbound seam: receives finished records. Transport is the host's
/// concern.
pub trait AuditPublisher: Send + Sync {
    /// Deliver one finished record
    fn publish(&self, record: &AuditRecord);
}

/// Builder wiring configuration, registered functions and the outbound
/// collaborators into an [`AuditEngine`].
#[derive(Default)]
pub struct AuditEngineBuilder {
    config: AuditConfig,
    candidates: Vec<Arc<dyn AuditFunction>>,
    operator_provider: Option<Arc<dyn OperatorProvider>>,
    publisher: Option<Arc<dyn AuditPublisher>>,
}

impl AuditEngineBuilder {
    /// Start building an engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration
    pub fn config(mut self, config: AuditConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a candidate function, registered at build time
    pub fn function(mut self, function: Arc<dyn AuditFunction>) -> Self {
        self.candidates.push(function);
        self
    }

    /// Add all candidate functions found by the startup scan
    pub fn functions(mut self, functions: impl IntoIterator<Item = Arc<dyn AuditFunction>>) -> Self {
        self.candidates.extend(functions);
        self
    }

    /// Set the operator provider consulted for blank operator ids
    pub fn operator_provider(mut self, provider: Arc<dyn OperatorProvider>) -> Self {
        self.operator_provider = Some(provider);
        self
    }

    /// Set the record publisher
    pub fn publisher(mut self, publisher: Arc<dyn AuditPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Register all candidates and assemble the engine. Registration
    /// conflicts are startup-fatal, not retried.
    pub fn build(self) -> Result<AuditEngine, RegistryError> {
        let formatter = DiffFormatter::from_config(&self.config.diff);
        let mut registry = FunctionRegistry::standard(formatter);
        for candidate in self.candidates {
            registry.register(candidate)?;
        }
        Ok(AuditEngine {
            registry: Arc::new(registry),
            evaluator: Evaluator::new(),
            operator_provider: self.operator_provider,
            publisher: self.publisher,
        })
    }
}

/// Resolves directives into audit records.
pub struct AuditEngine {
    registry: Arc<FunctionRegistry>,
    evaluator: Evaluator,
    operator_provider: Option<Arc<dyn OperatorProvider>>,
    publisher: Option<Arc<dyn AuditPublisher>>,
}

impl AuditEngine {
    /// Start building an engine
    pub fn builder() -> AuditEngineBuilder {
        AuditEngineBuilder::new()
    }

    /// The function registry backing this engine
    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// The expression evaluator backing this engine
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Resolve a directive against an invocation and publish the record.
    ///
    /// Returns `None` when the condition gates the record out. The scope is
    /// cleared on every path, including a gated-out record, so the execution
    /// carrier can be reused by the next operation.
    pub fn observe(
        &self,
        directive: &AuditDirective,
        invocation: &Invocation,
        scope: &ExecutionScope,
    ) -> Option<AuditRecord> {
        let record = self.resolve(directive, invocation, scope);
        scope.clear();

        if let (Some(record), Some(publisher)) = (&record, &self.publisher) {
            publisher.publish(record);
            log::debug!("Published audit record {}", record.id);
        }
        record
    }

    fn resolve(
        &self,
        directive: &AuditDirective,
        invocation: &Invocation,
        scope: &ExecutionScope,
    ) -> Option<AuditRecord> {
        let created_at = Utc::now();
        scope.context_for(invocation, &self.registry);

        if directive.returning && !directive.prelude {
            let result = invocation.result.clone().unwrap_or(Value::Null);
            scope.put_variable(RESULT_VARIABLE, result);
        }

        // Case-insensitive, like Boolean.parseBoolean: "TRUE" also passes
        if !self
            .evaluator
            .evaluate(&directive.condition, scope)
            .eq_ignore_ascii_case("true")
        {
            log::debug!("The resolved condition is false, no record produced");
            return None;
        }

        // Success reflects the business outcome and any errors recorded so
        // far; later expression failures are carried in `errors` but do not
        // flip the flag, matching when the flag is observed.
        let success = invocation.error.is_none() && scope.errors().is_empty();

        let record = AuditRecord {
            id: Uuid::new_v4().simple().to_string(),
            operator_id: self.resolve_operator_id(directive, scope),
            tag: self.evaluator.evaluate(&directive.tag, scope),
            message: self.evaluator.evaluate(&directive.message, scope),
            category: self.evaluator.evaluate(&directive.category, scope),
            business_id: self.evaluator.evaluate(&directive.business_id, scope),
            additional: self.evaluator.evaluate(&directive.additional, scope),
            success,
            created_at,
            elapsed_millis: scope.elapsed_millis(),
            errors: invocation
                .error
                .iter()
                .cloned()
                .chain(scope.errors())
                .collect(),
            diffs: scope.diff_results(),
        };
        Some(record)
    }

    // Blank operator id falls back to the provider; a missing provider
    // leaves it empty.
    fn resolve_operator_id(&self, directive: &AuditDirective, scope: &ExecutionScope) -> String {
        if !directive.operator_id.trim().is_empty() {
            return self.evaluator.evaluate(&directive.operator_id, scope);
        }
        self.operator_provider
            .as_ref()
            .and_then(|provider| provider.current_operator_id())
            .unwrap_or_else(|| {
                log::debug!("No operator id declared and none available from the provider");
                String::new()
            })
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::evaluator::MethodIdentity;
    use crate::model::ObjectRecord;
    use crate::registry::ClosureFunction;

    struct FixedOperator;

    impl OperatorProvider for FixedOperator {
        fn current_operator_id(&self) -> Option<String> {
            Some("op-123".to_string())
        }
    }

    #[derive(Default)]
    struct CapturingPublisher {
        records: Mutex<Vec<AuditRecord>>,
    }

    impl AuditPublisher for CapturingPublisher {
        fn publish(&self, record: &AuditRecord) {
            self.records.lock().push(record.clone());
        }
    }

    fn engine() -> AuditEngine {
        AuditEngine::builder()
            .function(Arc::new(ClosureFunction::new("findUserName", |args| {
                Ok(Value::String(format!("user-{}", args[0])))
            })))
            .operator_provider(Arc::new(FixedOperator))
            .build()
            .unwrap()
    }

    fn create_order_invocation() -> Invocation {
        let request: Value = ObjectRecord::builder("CreateOrderRequest")
            .field("userId", "42")
            .field("address", "幸福小区1号")
            .build()
            .into();
        Invocation::new(
            Value::Null,
            MethodIdentity::new("OrderService", "createOrder", ["request"]),
            vec![request],
        )
        .with_result(Value::from("order-1"))
    }

    #[test]
    fn test_observe_resolves_all_fields() {
        let engine = engine();
        let scope = ExecutionScope::new();
        let directive = AuditDirective::message(
            "'I am create order: ' + #findUserName(#request.userId)",
        )
        .category("'Order'")
        .business_id("#result")
        .tag("'create'");

        let record = engine
            .observe(&directive, &create_order_invocation(), &scope)
            .unwrap();

        assert_eq!(record.message, "I am create order: user-42");
        assert_eq!(record.category, "Order");
        assert_eq!(record.business_id, "order-1");
        assert_eq!(record.tag, "create");
        assert_eq!(record.operator_id, "op-123");
        assert!(record.success);
        assert!(record.errors.is_empty());
        assert_eq!(record.additional, "");
        assert!(!scope.has_context());
    }

    #[test]
    fn test_condition_gates_record_out() {
        let engine = engine();
        let scope = ExecutionScope::new();
        let directive = AuditDirective::message("'m'").condition("1 > 2");

        assert!(engine.observe(&directive, &create_order_invocation(), &scope).is_none());
        assert!(!scope.has_context());
    }

    #[test]
    fn test_condition_compare_ignores_case() {
        let engine = engine();
        let scope = ExecutionScope::new();
        let directive = AuditDirective::message("'m'").condition("'TRUE'");

        assert!(engine.observe(&directive, &create_order_invocation(), &scope).is_some());

        let gated = AuditDirective::message("'m'").condition("'False'");
        assert!(engine.observe(&gated, &create_order_invocation(), &scope).is_none());
    }

    #[test]
    fn test_operator_expression_wins_over_provider() {
        let engine = engine();
        let scope = ExecutionScope::new();
        let directive = AuditDirective::message("'m'").operator_id("'declared'");

        let record = engine
            .observe(&directive, &create_order_invocation(), &scope)
            .unwrap();
        assert_eq!(record.operator_id, "declared");
    }

    #[test]
    fn test_business_error_marks_failure() {
        let engine = engine();
        let scope = ExecutionScope::new();
        let invocation = Invocation::new(
            Value::Null,
            MethodIdentity::new("OrderService", "createOrder", ["request"]),
            vec![Value::from("req")],
        )
        .with_error("order already exists");

        let record = engine
            .observe(&AuditDirective::message("'m'"), &invocation, &scope)
            .unwrap();
        assert!(!record.success);
        assert_eq!(record.errors, vec!["order already exists".to_string()]);
    }

    #[test]
    fn test_broken_expression_degrades_to_literal_text() {
        let engine = engine();
        let scope = ExecutionScope::new();
        let directive = AuditDirective::message("#nope + 1");

        let record = engine
            .observe(&directive, &create_order_invocation(), &scope)
            .unwrap();
        assert_eq!(record.message, "#nope + 1");
        assert_eq!(record.errors.len(), 1);
        // The condition gate ran first, so the flag was already settled
        assert!(record.success);
    }

    #[test]
    fn test_prelude_skips_result_binding() {
        let engine = engine();
        let scope = ExecutionScope::new();
        let directive = AuditDirective::message("#result").prelude(true);

        let record = engine
            .observe(&directive, &create_order_invocation(), &scope)
            .unwrap();
        // `#result` is unbound before the business call; literal fallback
        assert_eq!(record.message, "#result");
    }

    #[test]
    fn test_publisher_receives_record() {
        let publisher = Arc::new(CapturingPublisher::default());
        let engine = AuditEngine::builder()
            .publisher(publisher.clone())
            .build()
            .unwrap();
        let scope = ExecutionScope::new();

        engine.observe(
            &AuditDirective::message("'hello'"),
            &create_order_invocation(),
            &scope,
        );
        let records = publisher.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "hello");
    }

    #[test]
    fn test_diff_results_carried_on_record() {
        let engine = engine();
        let scope = ExecutionScope::new();
        let old: Value = ObjectRecord::builder("UserProfile").field("age", 22).build().into();
        let new: Value = ObjectRecord::builder("UserProfile").field("age", 23).build().into();

        let invocation = Invocation::new(
            Value::Null,
            MethodIdentity::new("UserService", "modifyUser", ["oldUser", "newUser"]),
            vec![old, new],
        );
        let directive = AuditDirective::message("'changed: ' + #diff(#oldUser, #newUser)");

        let record = engine.observe(&directive, &invocation, &scope).unwrap();
        assert_eq!(record.message, "changed: age updated from [22] to [23]");
        assert_eq!(record.diffs.len(), 1);
        assert_eq!(record.diffs[0].fields.len(), 1);
    }
}
