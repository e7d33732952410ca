//! Runtime value representation
//!
//! Everything the evaluator produces or consumes is a `Value`:
//! - Numbers, booleans: immediate
//! - Strings, lists, matrices: owned, value semantics
//! - Models: immutable trained payloads behind an `Arc` (cheap to rebind)
//! - Unit: the absent/void result
//!
//! Every operator and command boundary matches exhaustively on the variants
//! it accepts; the conversion helpers here centralize those checks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Tagged value union.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    List(Vec<Value>),
    /// Rows of equal length; a single index yields the row as a list.
    Matrix(Vec<Vec<Value>>),
    Model(Arc<Model>),
    Unit,
}

/// Trained model payloads. A closed union so predict dispatch is exhaustive
/// and cannot fall through to a wrong default.
#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    Perceptron {
        weights: Vec<f64>,
        bias: f64,
    },
    Mlp(MlpNet),
    LinearRegression {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    KMeans {
        centroids: Vec<Vec<f64>>,
        assignments: Vec<i64>,
        k: usize,
    },
    Dbscan {
        labels: Vec<i64>,
        clusters: usize,
        eps: f64,
        min_points: usize,
    },
    Hierarchical {
        assignments: Vec<i64>,
        clusters: usize,
    },
    /// Placeholder produced by `load_model`; persistence is a stub.
    Loaded {
        path: String,
    },
}

impl Model {
    /// Registry tag string for this model kind.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Model::Perceptron { .. } => "perceptron",
            Model::Mlp(_) => "mlp",
            Model::LinearRegression { .. } => "linear_regression",
            Model::KMeans { .. } => "kmeans",
            Model::Dbscan { .. } => "dbscan",
            Model::Hierarchical { .. } => "hierarchical",
            Model::Loaded { .. } => "loaded",
        }
    }
}

/// Weights of a single-hidden-layer network with sigmoid activations.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpNet {
    /// `inputs x hidden`
    pub input_weights: Vec<Vec<f64>>,
    /// `hidden x outputs`
    pub output_weights: Vec<Vec<f64>>,
    pub hidden_bias: Vec<f64>,
    pub output_bias: Vec<f64>,
    pub inputs: usize,
    pub hidden: usize,
    pub outputs: usize,
}

/// Fatal runtime errors. These abort the current script run; recoverable
/// conditions never become a `RuntimeError` — they are reported through the
/// output channel and evaluation continues. Library errors surfaced at the
/// command-dispatch boundary are downgraded to reports there.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("name '{0}' is not defined")]
    NameNotFound(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of range for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("scope stack underflow")]
    ScopeUnderflow,
    #[error("matrix is singular")]
    SingularMatrix,
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("i/o error: {0}")]
    Io(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::List(_) => "list",
            Value::Matrix(_) => "matrix",
            Value::Model(_) => "model",
            Value::Unit => "unit",
        }
    }

    pub fn as_number(&self) -> Result<f64, RuntimeError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(RuntimeError::TypeMismatch(format!(
                "expected number, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_bool(&self) -> Result<bool, RuntimeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(RuntimeError::TypeMismatch(format!(
                "expected boolean, found {}",
                other.type_name()
            ))),
        }
    }

    /// Truncating integer coercion, used wherever the language accepts a
    /// fractional literal in an integral position (indices, counts, epochs).
    pub fn as_int(&self) -> Result<i64, RuntimeError> {
        Ok(self.as_number()? as i64)
    }

    pub fn as_model(&self) -> Result<&Arc<Model>, RuntimeError> {
        match self {
            Value::Model(m) => Ok(m),
            other => Err(RuntimeError::TypeMismatch(format!(
                "expected model, found {}",
                other.type_name()
            ))),
        }
    }

    /// Flattens a list of numbers.
    pub fn number_list(&self) -> Result<Vec<f64>, RuntimeError> {
        match self {
            Value::List(items) => items.iter().map(Value::as_number).collect(),
            other => Err(RuntimeError::TypeMismatch(format!(
                "expected list of numbers, found {}",
                other.type_name()
            ))),
        }
    }

    /// Flattens a matrix (or list of lists) of numbers into plain rows.
    pub fn number_matrix(&self) -> Result<Vec<Vec<f64>>, RuntimeError> {
        match self {
            Value::Matrix(rows) => rows
                .iter()
                .map(|row| row.iter().map(Value::as_number).collect())
                .collect(),
            Value::List(items) => items.iter().map(Value::number_list).collect(),
            other => Err(RuntimeError::TypeMismatch(format!(
                "expected matrix, found {}",
                other.type_name()
            ))),
        }
    }

    /// Classification labels: numbers truncated to integers.
    pub fn label_list(&self) -> Result<Vec<i64>, RuntimeError> {
        match self {
            Value::List(items) => items.iter().map(Value::as_int).collect(),
            other => Err(RuntimeError::TypeMismatch(format!(
                "expected list of labels, found {}",
                other.type_name()
            ))),
        }
    }

    /// Display strings for each element, used by bar-chart labels and CSV
    /// serialization where any scalar is acceptable.
    pub fn display_list(&self) -> Result<Vec<String>, RuntimeError> {
        match self {
            Value::List(items) => Ok(items.iter().map(Value::to_string).collect()),
            other => Err(RuntimeError::TypeMismatch(format!(
                "expected list, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn from_number_list(values: Vec<f64>) -> Value {
        Value::List(values.into_iter().map(Value::Number).collect())
    }

    pub fn from_number_matrix(rows: Vec<Vec<f64>>) -> Value {
        Value::Matrix(
            rows.into_iter()
                .map(|row| row.into_iter().map(Value::Number).collect())
                .collect(),
        )
    }

    pub fn from_label_list(labels: Vec<i64>) -> Value {
        Value::List(labels.into_iter().map(|l| Value::Number(l as f64)).collect())
    }

    pub fn model(model: Model) -> Value {
        Value::Model(Arc::new(model))
    }
}

/// Formats a number without the trailing `.0` when it is integral.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Matrix(rows) => {
                write!(f, "[")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[")?;
                    for (j, item) in row.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{item}")?;
                    }
                    write!(f, "]")?;
                }
                write!(f, "]")
            }
            Value::Model(m) => write!(f, "<model {}>", m.type_tag()),
            Value::Unit => write!(f, "unit"),
        }
    }
}

/// Metric map attached to a stored model.
pub type Metrics = HashMap<String, f64>;
