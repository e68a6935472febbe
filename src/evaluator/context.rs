//! Per-invocation binding environment
//!
//! Mirrors the intercepted method call: the target instance as root object,
//! the method identity, the positional arguments, a variable map, and the
//! function table snapshot. Argument aliases are materialized lazily, at most
//! once, and only when a variable lookup misses the explicit map.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::model::Value;
use crate::registry::AuditFunction;

/// Reserved variable name bound to the method's return value
pub const RESULT_VARIABLE: &str = "result";

/// Positional argument alias prefix (`a0`, `a1`, ...)
pub const ARG_ALIAS_A: &str = "a";

/// Positional argument alias prefix (`p0`, `p1`, ...)
pub const ARG_ALIAS_P: &str = "p";

/// Identity of an intercepted operation: declaring type, method name and
/// declared parameter names. Used as the expression cache key and for
/// argument-name discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodIdentity {
    declaring_type: String,
    name: String,
    parameter_names: Vec<String>,
}

impl MethodIdentity {
    /// Create a method identity
    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        parameter_names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            parameter_names: parameter_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Placeholder identity for a context created before any invocation is
    /// known (for example, variables stashed ahead of the business call)
    pub fn unknown() -> Self {
        Self {
            declaring_type: String::new(),
            name: String::new(),
            parameter_names: Vec::new(),
        }
    }

    /// Whether this is the placeholder identity
    pub fn is_unknown(&self) -> bool {
        self.declaring_type.is_empty() && self.name.is_empty()
    }

    /// The declaring type name
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// The method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter names, in order
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Canonical signature string, part of the expression cache key
    pub fn signature(&self) -> String {
        format!(
            "{}::{}({})",
            self.declaring_type,
            self.name,
            self.parameter_names.join(", ")
        )
    }
}

/// The binding environment one expression evaluates against.
#[derive(Clone)]
pub struct EvaluationContext {
    root: Value,
    method: MethodIdentity,
    arguments: Vec<Value>,
    variables: FxHashMap<String, Value>,
    functions: FxHashMap<String, Arc<dyn AuditFunction>>,
    arguments_loaded: bool,
}

impl EvaluationContext {
    /// Create a context for one invocation
    pub fn new(
        root: Value,
        method: MethodIdentity,
        arguments: Vec<Value>,
        functions: FxHashMap<String, Arc<dyn AuditFunction>>,
    ) -> Self {
        Self {
            root,
            method,
            arguments,
            variables: FxHashMap::default(),
            functions,
            arguments_loaded: false,
        }
    }

    /// Create a context with no invocation attached yet; variables set on it
    /// survive later initialization
    pub fn detached() -> Self {
        Self::new(
            Value::Null,
            MethodIdentity::unknown(),
            Vec::new(),
            FxHashMap::default(),
        )
    }

    /// Attach invocation data to a detached context. No-op when the context
    /// already belongs to an invocation.
    pub fn initialize(
        &mut self,
        root: Value,
        method: MethodIdentity,
        arguments: Vec<Value>,
        functions: FxHashMap<String, Arc<dyn AuditFunction>>,
    ) {
        if !self.method.is_unknown() {
            return;
        }
        log::debug!("Initializing evaluation context for {}", method.signature());
        self.root = root;
        self.method = method;
        self.arguments = arguments;
        self.functions = functions;
        self.arguments_loaded = false;
    }

    /// The target instance the intercepted method was called on
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The intercepted operation's identity
    pub fn method(&self) -> &MethodIdentity {
        &self.method
    }

    /// Bind a variable, overwriting any previous binding
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Look up a variable, lazily materializing argument aliases on the first
    /// miss against the explicit map.
    pub fn lookup_variable(&mut self, name: &str) -> Option<Value> {
        if let Some(value) = self.variables.get(name) {
            return Some(value.clone());
        }
        if !self.arguments_loaded {
            self.load_arguments();
            self.arguments_loaded = true;
            return self.variables.get(name).cloned();
        }
        None
    }

    /// Look up a registered function by name
    pub fn lookup_function(&self, name: &str) -> Option<Arc<dyn AuditFunction>> {
        self.functions.get(name).cloned()
    }

    // Expose `a<i>`/`p<i>` aliases and declared parameter names for each
    // argument. Runs at most once per context. Excess trailing arguments are
    // bundled as an array bound to the last parameter's aliases.
    fn load_arguments(&mut self) {
        if self.arguments.is_empty() {
            return;
        }

        let param_names = self.method.parameter_names();
        let args_count = self.arguments.len();
        let param_count = if param_names.is_empty() {
            args_count
        } else {
            param_names.len()
        };
        log::debug!(
            "Lazily binding {args_count} arguments to {param_count} parameters for {}",
            self.method.signature()
        );

        for i in 0..param_count {
            let value = if args_count > param_count && i == param_count - 1 {
                Value::Array(self.arguments[i..].to_vec())
            } else if i < args_count {
                self.arguments[i].clone()
            } else {
                Value::Null
            };

            self.variables
                .insert(format!("{ARG_ALIAS_A}{i}"), value.clone());
            self.variables
                .insert(format!("{ARG_ALIAS_P}{i}"), value.clone());
            if let Some(name) = param_names.get(i) {
                self.variables.insert(name.clone(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(param_names: &[&str], arguments: Vec<Value>) -> EvaluationContext {
        EvaluationContext::new(
            Value::Null,
            MethodIdentity::new("OrderService", "createOrder", param_names.to_vec()),
            arguments,
            FxHashMap::default(),
        )
    }

    #[test]
    fn test_explicit_variable_wins_without_loading() {
        let mut ctx = context(&["request"], vec![Value::from("arg")]);
        ctx.set_variable("request", Value::from("explicit"));
        assert_eq!(ctx.lookup_variable("request"), Some(Value::from("explicit")));
        // No miss happened, aliases are still unbound in the explicit map
        assert!(!ctx.arguments_loaded);
    }

    #[test]
    fn test_lazy_alias_binding() {
        let mut ctx = context(&["oldAddress", "newAddress"], vec![
            Value::from("old st"),
            Value::from("new st"),
        ]);

        assert_eq!(ctx.lookup_variable("a0"), Some(Value::from("old st")));
        assert_eq!(ctx.lookup_variable("p1"), Some(Value::from("new st")));
        assert_eq!(ctx.lookup_variable("newAddress"), Some(Value::from("new st")));
        assert_eq!(ctx.lookup_variable("missing"), None);
    }

    #[test]
    fn test_loading_happens_once() {
        let mut ctx = context(&["x"], vec![Value::Integer(1)]);
        assert_eq!(ctx.lookup_variable("x"), Some(Value::Integer(1)));
        // Rebinding an alias then looking up an unknown name must not reload
        ctx.set_variable("x", Value::Integer(2));
        assert_eq!(ctx.lookup_variable("missing"), None);
        assert_eq!(ctx.lookup_variable("x"), Some(Value::Integer(2)));
    }

    #[test]
    fn test_variadic_tail_bundled_into_last_parameter() {
        let mut ctx = context(&["first", "rest"], vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]);

        assert_eq!(ctx.lookup_variable("first"), Some(Value::Integer(1)));
        assert_eq!(
            ctx.lookup_variable("rest"),
            Some(Value::Array(vec![Value::Integer(2), Value::Integer(3)]))
        );
        assert_eq!(
            ctx.lookup_variable("a1"),
            Some(Value::Array(vec![Value::Integer(2), Value::Integer(3)]))
        );
    }

    #[test]
    fn test_missing_arguments_bind_null() {
        let mut ctx = context(&["given", "absent"], vec![Value::Integer(1)]);
        assert_eq!(ctx.lookup_variable("absent"), Some(Value::Null));
    }

    #[test]
    fn test_detached_then_initialized() {
        let mut ctx = EvaluationContext::detached();
        ctx.set_variable("stashed", Value::Integer(7));

        ctx.initialize(
            Value::Null,
            MethodIdentity::new("S", "m", ["x"]),
            vec![Value::Integer(1)],
            FxHashMap::default(),
        );
        assert_eq!(ctx.lookup_variable("stashed"), Some(Value::Integer(7)));
        assert_eq!(ctx.lookup_variable("x"), Some(Value::Integer(1)));

        // A second initialize must not overwrite the attached invocation
        ctx.initialize(
            Value::Null,
            MethodIdentity::new("Other", "n", Vec::<String>::new()),
            Vec::new(),
            FxHashMap::default(),
        );
        assert_eq!(ctx.method().name(), "m");
    }
}
