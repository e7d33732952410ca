//! Tree-walking evaluator
//!
//! One `Interpreter` owns all run state: the scope chain, the call stack,
//! the function/model/dataframe registries, the output sink and the pending
//! control-flow signal. Statement dispatch lives in `stmt`, expression
//! dispatch in `expr`, built-in command dispatch in `command`.
//!
//! Two error severities:
//! - `RuntimeError` values are fatal; they propagate with `?` and abort the
//!   run with every opened scope already popped.
//! - Recoverable conditions (undefined function, arity mismatch, index out
//!   of range, any failure inside a built-in command) are reported through
//!   the output sink and evaluation continues with `Value::Unit`.

mod command;
mod expr;
mod stmt;

use crate::ast::Program;
use crate::context::{CallStack, FunctionRegistry, ScopeChain, ScopeKind};
use crate::output::Output;
use crate::registry::{DataframeRegistry, ModelRegistry};
use crate::value::{RuntimeError, Value};

/// Pending non-local control flow. `Return` unwinds through loop,
/// conditional and block scopes until the nearest function boundary (or the
/// top level) consumes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Signal {
    #[default]
    None,
    Return(Value),
}

pub struct Interpreter {
    pub(crate) scopes: ScopeChain,
    pub(crate) calls: CallStack,
    pub(crate) functions: FunctionRegistry,
    pub(crate) models: ModelRegistry,
    pub(crate) dataframes: DataframeRegistry,
    pub(crate) out: Output,
    pub(crate) signal: Signal,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Output::stdout())
    }

    /// Builds an interpreter writing to the given sink; tests pass
    /// `Output::capture()` and assert on the collected lines.
    pub fn with_output(out: Output) -> Self {
        Interpreter {
            scopes: ScopeChain::new(),
            calls: CallStack::new(),
            functions: FunctionRegistry::new(),
            models: ModelRegistry::new(),
            dataframes: DataframeRegistry::new(),
            out,
            signal: Signal::None,
        }
    }

    /// Runs a program to completion. A top-level `return` stops the run and
    /// yields its value; otherwise the result is `Unit`.
    pub fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        self.signal = Signal::None;
        for stmt in &program.statements {
            self.exec_stmt(stmt)?;
            if let Signal::Return(value) = std::mem::take(&mut self.signal) {
                return Ok(value);
            }
        }
        Ok(Value::Unit)
    }

    /// Calls a user-defined function with already-evaluated arguments.
    ///
    /// An unknown name or an arity mismatch is recoverable: it is reported
    /// and the call yields `Unit` with no scope or call-stack mutation. A
    /// real call opens a function-kind frame and a call record together and
    /// closes both together, even when the body fails.
    pub fn invoke(&mut self, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let Some(function) = self.functions.lookup(name).cloned() else {
            self.out.error(format!("function '{name}' is not defined"));
            return Ok(Value::Unit);
        };
        if function.params.len() != args.len() {
            self.out.error(format!(
                "function '{name}' takes {} arguments, {} given",
                function.params.len(),
                args.len()
            ));
            return Ok(Value::Unit);
        }

        self.calls.enter_call(name, args.clone());
        self.scopes.enter_scope(ScopeKind::Function);
        for (param, arg) in function.params.iter().zip(args) {
            self.scopes.define_local(param, arg);
        }

        let result = self.exec_statements(&function.body.statements);

        self.scopes.exit_scope()?;
        self.calls.exit_call();
        result?;

        match std::mem::take(&mut self.signal) {
            Signal::Return(value) => Ok(value),
            Signal::None => Ok(Value::Unit),
        }
    }

    /// Drops all run state; the output sink and its captured lines survive.
    pub fn reset(&mut self) {
        self.scopes.clear();
        self.calls.clear();
        self.functions.clear();
        self.models.clear();
        self.dataframes.clear();
        self.signal = Signal::None;
    }

    pub fn output(&self) -> &Output {
        &self.out
    }

    /// Seeds a global binding before a run, used by embedders and tests.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.scopes.define_global(name, value);
    }

    /// Reads a variable visible from the current scope, if any.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.lookup(name).ok()
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    pub fn call_depth(&self) -> usize {
        self.calls.depth()
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn dataframes(&self) -> &DataframeRegistry {
        &self.dataframes
    }
}
