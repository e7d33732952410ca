//! Minerva Runtime - Tree-walking evaluator for numeric scripting
//!
//! This library executes already-parsed Minerva programs:
//! - Scoped variable environment with a global frame and kind-tagged locals
//! - Statement and expression evaluation with function calls and loops
//! - Built-in commands for model training, clustering, plotting and CSV I/O
//! - Registries for trained models and loaded dataframes

/// Minerva runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod ast;
pub mod context;
pub mod interpreter;
pub mod output;
pub mod registry;
pub mod stdlib;
pub mod value;

// Re-export commonly used types
pub use ast::{Block, Command, Expr, Program, Stmt};
pub use context::{CallStack, FunctionRegistry, ScopeChain, ScopeKind};
pub use interpreter::{Interpreter, Signal};
pub use output::Output;
pub use registry::{Dataframe, DataframeRegistry, ModelRegistry};
pub use value::{Model, RuntimeError, Value};
