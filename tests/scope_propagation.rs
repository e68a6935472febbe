//! Scope hand-off across asynchronous continuations

use audit_trail::evaluator::Evaluator;
use audit_trail::model::Value;
use audit_trail::registry::FunctionRegistry;
use audit_trail::scope::{ExecutionScope, Invocation};
use audit_trail::{DiffFormatter, DiffResult, MethodIdentity};
use pretty_assertions::assert_eq;

fn opened_scope(registry: &FunctionRegistry) -> ExecutionScope {
    let scope = ExecutionScope::new();
    scope.context_for(
        &Invocation::new(
            Value::Null,
            MethodIdentity::new("OrderService", "createOrder", ["request"]),
            vec![Value::from("req-1")],
        ),
        registry,
    );
    scope
}

#[tokio::test(flavor = "multi_thread")]
async fn snapshot_survives_task_boundary() {
    let registry = FunctionRegistry::standard(DiffFormatter::default());
    let scope = opened_scope(&registry);
    scope.record_diff(DiffResult::new("A", "B"));

    let snapshot = scope.snapshot();
    let handle = tokio::spawn(async move {
        let evaluator = Evaluator::new();
        let message = evaluator.evaluate("'continued: ' + #request", &snapshot);
        (message, snapshot.diff_results().len())
    });

    // The owner finishes and clears before the continuation is inspected
    scope.clear();

    let (message, diff_count) = handle.await.unwrap();
    assert_eq!(message, "continued: req-1");
    assert_eq!(diff_count, 1);
    assert!(!scope.has_context());
    assert!(scope.diff_results().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn continuation_mutations_stay_local() {
    let registry = FunctionRegistry::standard(DiffFormatter::default());
    let scope = opened_scope(&registry);

    let snapshot = scope.snapshot();
    tokio::spawn(async move {
        snapshot.record_error("continuation-only");
        snapshot.clear();
    })
    .await
    .unwrap();

    assert!(scope.errors().is_empty());
    assert!(scope.has_context());
}

#[test]
fn clone_shares_the_same_operation() {
    let registry = FunctionRegistry::standard(DiffFormatter::default());
    let scope = opened_scope(&registry);

    let handle = scope.clone();
    handle.record_error("shared");
    assert_eq!(scope.errors(), vec!["shared".to_string()]);

    scope.clear();
    assert!(!handle.has_context());
}
