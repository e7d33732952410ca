//! Syntax tree node types
//!
//! The runtime consumes an already-built tree; the grammar front end that
//! produces it lives outside this crate. Node kinds map 1:1 onto the
//! statement and expression forms the evaluator dispatches on, so a front
//! end only needs to fill these structs in source order.

/// A complete script: top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }
}

/// A braced statement sequence. Executing one opens a fresh scope frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Block { statements }
    }
}

/// Statement forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Block),
    Declare(Declare),
    Assign(Assign),
    If(IfStmt),
    For(ForStmt),
    While(WhileStmt),
    FunctionDef(FunctionDef),
    Return(ReturnStmt),
    Print(PrintStmt),
    Command(Command),
    Expr(Expr),
}

/// Variable declaration, optionally forced into the global scope with the
/// `global` keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct Declare {
    pub global: bool,
    pub name: String,
    pub init: Expr,
}

/// Assignment statement. The grammar only allows indexed targets through a
/// bare name, so targets carry the name rather than a full expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: AssignTarget,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    /// `x = expr`
    Name(String),
    /// `xs[i] = expr`
    Index { name: String, index: Expr },
    /// `m[r][c] = expr`
    Index2 { name: String, row: Expr, col: Expr },
}

/// `if` / `elif`* / `else`? chain.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Block,
    pub elif_branches: Vec<ElifBranch>,
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElifBranch {
    pub cond: Expr,
    pub block: Block,
}

/// `for` loop: either the `range(...)` form or iteration over a list value.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub var: String,
    pub iter: ForIter,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForIter {
    /// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`.
    Range {
        start: Option<Expr>,
        stop: Expr,
        step: Option<Expr>,
    },
    /// `for x in expr` where expr evaluates to a list.
    Each(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
}

/// `fn name(params) { body }` — registers the function, executes nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
}

/// `print expr` or `show expr` (`pretty` selects the matrix-aware form).
#[derive(Debug, Clone, PartialEq)]
pub struct PrintStmt {
    pub pretty: bool,
    pub expr: Expr,
}

/// Built-in command statements. Each delegates to a stdlib collaborator
/// after the evaluator has evaluated the argument expressions; `bind` names
/// the variable the result lands in when the script wrote `x = command(...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LinearRegression {
        x: Expr,
        y: Expr,
        bind: Option<String>,
    },
    Perceptron {
        x: Expr,
        y: Expr,
        learning_rate: Option<Expr>,
        epochs: Option<Expr>,
        bind: Option<String>,
    },
    MlpCreate {
        name: String,
        inputs: Expr,
        hidden: Expr,
        outputs: Expr,
    },
    MlpTrain {
        name: String,
        x: Expr,
        y: Expr,
        learning_rate: Option<Expr>,
        epochs: Option<Expr>,
    },
    Predict {
        model: String,
        data: Expr,
        bind: Option<String>,
    },
    Evaluate {
        truth: Expr,
        predicted: Expr,
        metric: Option<String>,
        bind: Option<String>,
    },
    KMeans {
        data: Expr,
        k: Expr,
        max_iter: Option<Expr>,
        bind: Option<String>,
    },
    Dbscan {
        data: Expr,
        eps: Expr,
        min_points: Expr,
        bind: Option<String>,
    },
    Hierarchical {
        data: Expr,
        clusters: Expr,
        linkage: Option<String>,
        bind: Option<String>,
    },
    ReadFile {
        path: String,
        lines: bool,
        bind: String,
    },
    WriteFile {
        path: String,
        value: Expr,
        append: bool,
    },
    ReadCsv {
        path: String,
        delimiter: Option<String>,
        header: Option<bool>,
        bind: String,
    },
    WriteCsv {
        path: String,
        data: Expr,
        header: Option<Expr>,
    },
    SaveModel {
        model: String,
        path: String,
    },
    LoadModel {
        path: String,
        bind: String,
    },
    PlotLine {
        x: Expr,
        y: Expr,
        title: Option<String>,
    },
    PlotScatter {
        x: Expr,
        y: Expr,
        title: Option<String>,
    },
    PlotBar {
        labels: Expr,
        values: Expr,
        title: Option<String>,
    },
    PlotHistogram {
        data: Expr,
        bins: Option<Expr>,
        title: Option<String>,
    },
    PlotRegression {
        x: Expr,
        y: Expr,
        title: Option<String>,
    },
    PlotFunction {
        function: String,
        start: Expr,
        end: Expr,
        title: Option<String>,
    },
}

/// Expression forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// String literal with the quote delimiters already stripped.
    Str(String),
    Bool(bool),
    Variable(String),
    List(Vec<Expr>),
    Matrix(Vec<Vec<Expr>>),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Index(IndexExpr),
    Index2(Index2Expr),
    Slice(SliceExpr),
    Call(CallExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `not x`
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Pow,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    /// Maps the operator token text a front end carries to the enum.
    pub fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        Some(match symbol {
            "**" => BinaryOp::Pow,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "and" => BinaryOp::And,
            "or" => BinaryOp::Or,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Pow => "**",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// `xs[i]`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub target: Box<Expr>,
    pub index: Box<Expr>,
}

/// `m[r][c]`
#[derive(Debug, Clone, PartialEq)]
pub struct Index2Expr {
    pub target: Box<Expr>,
    pub row: Box<Expr>,
    pub col: Box<Expr>,
}

/// `xs[start:end]` — half-open.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    pub target: Box<Expr>,
    pub start: Box<Expr>,
    pub end: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
}

impl Expr {
    pub fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Expr {
        Expr::Unary(UnaryExpr {
            op,
            expr: Box::new(expr),
        })
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn index(target: Expr, index: Expr) -> Expr {
        Expr::Index(IndexExpr {
            target: Box::new(target),
            index: Box::new(index),
        })
    }

    pub fn index2(target: Expr, row: Expr, col: Expr) -> Expr {
        Expr::Index2(Index2Expr {
            target: Box::new(target),
            row: Box::new(row),
            col: Box::new(col),
        })
    }

    pub fn slice(target: Expr, start: Expr, end: Expr) -> Expr {
        Expr::Slice(SliceExpr {
            target: Box::new(target),
            start: Box::new(start),
            end: Box::new(end),
        })
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Call(CallExpr {
            name: name.to_string(),
            args,
        })
    }
}
