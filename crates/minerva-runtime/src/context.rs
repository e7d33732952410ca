//! Interpreter state: scope chain, call stack, function registry
//!
//! The scope chain is a stack of kind-tagged binding frames over one
//! always-present global frame. Name resolution cascades innermost local →
//! global; the first frame containing the name wins. The call stack runs in
//! strict 1:1 LIFO lockstep with function-kind frames and is bookkeeping
//! only — it is never consulted for name resolution.

use crate::ast::Block;
use crate::value::{RuntimeError, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// What kind of construct opened a scope frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Function,
    Loop,
    Conditional,
    Block,
}

#[derive(Debug)]
struct Frame {
    kind: ScopeKind,
    bindings: HashMap<String, Value>,
}

/// Ordered stack of mutable binding maps.
#[derive(Debug, Default)]
pub struct ScopeChain {
    globals: HashMap<String, Value>,
    frames: Vec<Frame>,
}

impl ScopeChain {
    pub fn new() -> Self {
        ScopeChain {
            globals: HashMap::new(),
            frames: Vec::new(),
        }
    }

    /// Defines or overwrites a binding in the global frame, regardless of
    /// the current nesting level.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    /// Defines a binding in the innermost local frame, falling back to the
    /// global frame when no local frame is open.
    pub fn define_local(&mut self, name: &str, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.bindings.insert(name.to_string(), value);
            }
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    /// Cascading lookup, innermost → global.
    pub fn lookup(&self, name: &str) -> Result<&Value, RuntimeError> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.bindings.get(name) {
                return Ok(value);
            }
        }
        self.globals
            .get(name)
            .ok_or_else(|| RuntimeError::NameNotFound(name.to_string()))
    }

    /// Cascading mutable lookup, used by indexed assignment to mutate a
    /// bound list/matrix in place.
    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Value, RuntimeError> {
        for frame in self.frames.iter_mut().rev() {
            if let Some(value) = frame.bindings.get_mut(name) {
                return Ok(value);
            }
        }
        self.globals
            .get_mut(name)
            .ok_or_else(|| RuntimeError::NameNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.frames
            .iter()
            .rev()
            .any(|f| f.bindings.contains_key(name))
            || self.globals.contains_key(name)
    }

    /// Assigns to an existing binding found by the cascade. Assigning to a
    /// name absent from every frame creates it in the current scope — a
    /// deliberate language rule, not an error path.
    pub fn assign(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.bindings.get_mut(name) {
                *slot = value;
                return;
            }
        }
        if let Some(slot) = self.globals.get_mut(name) {
            *slot = value;
            return;
        }
        self.define_local(name, value);
    }

    pub fn enter_scope(&mut self, kind: ScopeKind) {
        self.frames.push(Frame {
            kind,
            bindings: HashMap::new(),
        });
    }

    /// Pops the innermost frame. Underflow means the evaluator lost an
    /// enter/exit pairing — an internal fault, never a script error.
    pub fn exit_scope(&mut self) -> Result<(), RuntimeError> {
        self.frames
            .pop()
            .map(|_| ())
            .ok_or(RuntimeError::ScopeUnderflow)
    }

    /// Number of open local frames (0 = global scope only).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_kind(&self) -> Option<ScopeKind> {
        self.frames.last().map(|f| f.kind)
    }

    pub fn clear(&mut self) {
        self.globals.clear();
        self.frames.clear();
    }
}

/// Bookkeeping entry for one active function invocation.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub function: String,
    pub args: Vec<Value>,
}

/// Stack of active call records, pushed/popped alongside function-kind
/// scope frames.
#[derive(Debug, Default)]
pub struct CallStack {
    records: Vec<CallRecord>,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            records: Vec::new(),
        }
    }

    pub fn enter_call(&mut self, function: &str, args: Vec<Value>) {
        self.records.push(CallRecord {
            function: function.to_string(),
            args,
        });
    }

    pub fn exit_call(&mut self) -> Option<CallRecord> {
        self.records.pop()
    }

    pub fn depth(&self) -> usize {
        self.records.len()
    }

    pub fn current(&self) -> Option<&CallRecord> {
        self.records.last()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// A user-defined function: parameter names plus the body block. The body
/// is shared via `Arc` so repeated calls do not clone the tree.
#[derive(Debug, Clone)]
pub struct StoredFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Arc<Block>,
}

/// Name → function definition map. Redefinition silently overwrites — last
/// writer wins, a documented design choice of the language.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<StoredFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    pub fn define(&mut self, name: &str, params: Vec<String>, body: Block) {
        self.functions.insert(
            name.to_string(),
            Arc::new(StoredFunction {
                name: name.to_string(),
                params,
                body: Arc::new(body),
            }),
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<StoredFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn clear(&mut self) {
        self.functions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_cascades_innermost_first() {
        let mut scopes = ScopeChain::new();
        scopes.define_global("x", Value::Number(1.0));
        scopes.enter_scope(ScopeKind::Function);
        scopes.define_local("x", Value::Number(2.0));
        scopes.enter_scope(ScopeKind::Block);
        scopes.define_local("x", Value::Number(3.0));

        assert_eq!(scopes.lookup("x").unwrap(), &Value::Number(3.0));
        scopes.exit_scope().unwrap();
        assert_eq!(scopes.lookup("x").unwrap(), &Value::Number(2.0));
        scopes.exit_scope().unwrap();
        assert_eq!(scopes.lookup("x").unwrap(), &Value::Number(1.0));
    }

    #[test]
    fn define_local_falls_back_to_global() {
        let mut scopes = ScopeChain::new();
        scopes.define_local("x", Value::Number(7.0));
        assert_eq!(scopes.depth(), 0);
        assert_eq!(scopes.lookup("x").unwrap(), &Value::Number(7.0));
    }

    #[test]
    fn assign_mutates_outer_binding() {
        let mut scopes = ScopeChain::new();
        scopes.define_global("x", Value::Number(1.0));
        scopes.enter_scope(ScopeKind::Loop);
        scopes.assign("x", Value::Number(5.0));
        scopes.exit_scope().unwrap();
        assert_eq!(scopes.lookup("x").unwrap(), &Value::Number(5.0));
    }

    #[test]
    fn assign_to_unknown_name_creates_in_current_scope() {
        let mut scopes = ScopeChain::new();
        scopes.enter_scope(ScopeKind::Block);
        scopes.assign("fresh", Value::Bool(true));
        assert_eq!(scopes.lookup("fresh").unwrap(), &Value::Bool(true));
        scopes.exit_scope().unwrap();
        assert!(scopes.lookup("fresh").is_err());
    }

    #[test]
    fn exit_scope_underflow_is_an_error() {
        let mut scopes = ScopeChain::new();
        assert_eq!(scopes.exit_scope(), Err(RuntimeError::ScopeUnderflow));
    }

    #[test]
    fn scope_kinds_are_tracked() {
        let mut scopes = ScopeChain::new();
        assert_eq!(scopes.current_kind(), None);
        scopes.enter_scope(ScopeKind::Conditional);
        assert_eq!(scopes.current_kind(), Some(ScopeKind::Conditional));
    }

    #[test]
    fn call_stack_is_lifo() {
        let mut calls = CallStack::new();
        calls.enter_call("outer", vec![Value::Number(1.0)]);
        calls.enter_call("inner", vec![]);
        assert_eq!(calls.depth(), 2);
        assert_eq!(calls.current().unwrap().function, "inner");
        assert_eq!(calls.exit_call().unwrap().function, "inner");
        assert_eq!(calls.exit_call().unwrap().function, "outer");
        assert!(calls.exit_call().is_none());
    }

    #[test]
    fn function_redefinition_overwrites() {
        let mut registry = FunctionRegistry::new();
        registry.define("f", vec!["a".into()], Block::default());
        registry.define("f", vec!["a".into(), "b".into()], Block::default());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("f").unwrap().params.len(), 2);
    }
}
