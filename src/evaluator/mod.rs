//! Expression evaluation: per-invocation context, compile cache, evaluator

mod cache;
mod context;
mod engine;
mod error;

pub use cache::{ExpressionCache, ExpressionKey};
pub use context::{
    ARG_ALIAS_A, ARG_ALIAS_P, EvaluationContext, MethodIdentity, RESULT_VARIABLE,
};
pub use engine::Evaluator;
pub use error::{EvaluationError, EvaluationResult};
