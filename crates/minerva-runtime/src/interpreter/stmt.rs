//! Statement execution
//!
//! Every construct that opens a scope frame closes it on every path out,
//! including fatal errors and a pending return signal: the frame result is
//! captured first, the frame is popped, and only then does the result
//! propagate.

use super::{Interpreter, Signal};
use crate::ast::{
    Assign, AssignTarget, Block, Declare, ForIter, ForStmt, IfStmt, PrintStmt, ReturnStmt, Stmt,
    WhileStmt,
};
use crate::context::ScopeKind;
use crate::stdlib::matrix;
use crate::value::{RuntimeError, Value};

impl Interpreter {
    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::Block(block) => self.exec_block(block, ScopeKind::Block),
            Stmt::Declare(declare) => self.exec_declare(declare),
            Stmt::Assign(assign) => self.exec_assign(assign),
            Stmt::If(if_stmt) => self.exec_if(if_stmt),
            Stmt::For(for_stmt) => self.exec_for(for_stmt),
            Stmt::While(while_stmt) => self.exec_while(while_stmt),
            Stmt::FunctionDef(def) => {
                self.functions
                    .define(&def.name, def.params.clone(), def.body.clone());
                Ok(())
            }
            Stmt::Return(ret) => self.exec_return(ret),
            Stmt::Print(print) => self.exec_print(print),
            Stmt::Command(command) => self.exec_command(command),
            Stmt::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
        }
    }

    /// Runs statements in the current frame, stopping at a pending signal.
    pub(crate) fn exec_statements(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            self.exec_stmt(stmt)?;
            if self.signal != Signal::None {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn exec_block(&mut self, block: &Block, kind: ScopeKind) -> Result<(), RuntimeError> {
        self.scopes.enter_scope(kind);
        let result = self.exec_statements(&block.statements);
        self.scopes.exit_scope()?;
        result
    }

    fn exec_declare(&mut self, declare: &Declare) -> Result<(), RuntimeError> {
        let value = self.eval_expr(&declare.init)?;
        if declare.global {
            self.scopes.define_global(&declare.name, value);
        } else {
            self.scopes.define_local(&declare.name, value);
        }
        Ok(())
    }

    fn exec_assign(&mut self, assign: &Assign) -> Result<(), RuntimeError> {
        let value = self.eval_expr(&assign.value)?;
        match &assign.target {
            AssignTarget::Name(name) => {
                self.scopes.assign(name, value);
                Ok(())
            }
            AssignTarget::Index { name, index } => {
                let index = self.eval_expr(index)?.as_int()?;
                self.assign_index(name, index, value)
            }
            AssignTarget::Index2 { name, row, col } => {
                let row = self.eval_expr(row)?.as_int()?;
                let col = self.eval_expr(col)?.as_int()?;
                self.assign_index2(name, row, col, value)
            }
        }
    }

    /// `xs[i] = v`. An out-of-range index, or a target that is not a
    /// list/matrix, is reported and the statement becomes a no-op.
    fn assign_index(&mut self, name: &str, index: i64, value: Value) -> Result<(), RuntimeError> {
        let target = self.scopes.lookup_mut(name)?;
        match target {
            Value::List(items) => {
                if index < 0 || index as usize >= items.len() {
                    let len = items.len();
                    self.report_index(index, len);
                    return Ok(());
                }
                items[index as usize] = value;
                Ok(())
            }
            Value::Matrix(rows) => {
                if index < 0 || index as usize >= rows.len() {
                    let len = rows.len();
                    self.report_index(index, len);
                    return Ok(());
                }
                match value {
                    Value::List(items) => {
                        rows[index as usize] = items;
                    }
                    other => {
                        let found = other.type_name();
                        self.out
                            .error(format!("matrix row assignment needs a list, found {found}"));
                    }
                }
                Ok(())
            }
            other => {
                let found = other.type_name();
                self.out
                    .error(format!("cannot assign by index into {found}"));
                Ok(())
            }
        }
    }

    /// `m[r][c] = v`.
    fn assign_index2(
        &mut self,
        name: &str,
        row: i64,
        col: i64,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let target = self.scopes.lookup_mut(name)?;
        let rows = match target {
            Value::Matrix(rows) => rows,
            other => {
                let found = other.type_name();
                self.out
                    .error(format!("cannot assign by index into {found}"));
                return Ok(());
            }
        };
        if row < 0 || row as usize >= rows.len() {
            let len = rows.len();
            self.report_index(row, len);
            return Ok(());
        }
        let cells = &mut rows[row as usize];
        if col < 0 || col as usize >= cells.len() {
            let len = cells.len();
            self.report_index(col, len);
            return Ok(());
        }
        cells[col as usize] = value;
        Ok(())
    }

    pub(crate) fn report_index(&mut self, index: i64, len: usize) {
        self.out
            .error(RuntimeError::IndexOutOfBounds { index, len }.to_string());
    }

    /// First branch whose condition is `true` runs; at most one branch runs.
    /// Conditions must be booleans.
    fn exec_if(&mut self, if_stmt: &IfStmt) -> Result<(), RuntimeError> {
        if self.eval_expr(&if_stmt.cond)?.as_bool()? {
            return self.exec_block(&if_stmt.then_block, ScopeKind::Conditional);
        }
        for branch in &if_stmt.elif_branches {
            if self.eval_expr(&branch.cond)?.as_bool()? {
                return self.exec_block(&branch.block, ScopeKind::Conditional);
            }
        }
        if let Some(else_block) = &if_stmt.else_block {
            return self.exec_block(else_block, ScopeKind::Conditional);
        }
        Ok(())
    }

    /// The loop variable lives in a loop-kind frame wrapping all iterations;
    /// each iteration's body runs in its own nested block frame.
    fn exec_for(&mut self, for_stmt: &ForStmt) -> Result<(), RuntimeError> {
        let items = match &for_stmt.iter {
            ForIter::Range { start, stop, step } => {
                let start = match start {
                    Some(expr) => self.eval_expr(expr)?.as_int()?,
                    None => 0,
                };
                let stop = self.eval_expr(stop)?.as_int()?;
                let step = match step {
                    Some(expr) => self.eval_expr(expr)?.as_int()?,
                    None => 1,
                };
                if step == 0 {
                    self.out.error("range step cannot be zero");
                    return Ok(());
                }
                let mut items = Vec::new();
                let mut i = start;
                while (step > 0 && i < stop) || (step < 0 && i > stop) {
                    items.push(Value::Number(i as f64));
                    i += step;
                }
                items
            }
            ForIter::Each(expr) => match self.eval_expr(expr)? {
                Value::List(items) => items,
                Value::Matrix(rows) => rows.into_iter().map(Value::List).collect(),
                other => {
                    return Err(RuntimeError::TypeMismatch(format!(
                        "cannot iterate over {}",
                        other.type_name()
                    )))
                }
            },
        };

        self.scopes.enter_scope(ScopeKind::Loop);
        let result = self.run_for_iterations(&for_stmt.var, items, &for_stmt.body);
        self.scopes.exit_scope()?;
        result
    }

    fn run_for_iterations(
        &mut self,
        var: &str,
        items: Vec<Value>,
        body: &Block,
    ) -> Result<(), RuntimeError> {
        for item in items {
            self.scopes.define_local(var, item);
            self.exec_block(body, ScopeKind::Block)?;
            if self.signal != Signal::None {
                break;
            }
        }
        Ok(())
    }

    fn exec_while(&mut self, while_stmt: &WhileStmt) -> Result<(), RuntimeError> {
        self.scopes.enter_scope(ScopeKind::Loop);
        let result = self.run_while_iterations(while_stmt);
        self.scopes.exit_scope()?;
        result
    }

    fn run_while_iterations(&mut self, while_stmt: &WhileStmt) -> Result<(), RuntimeError> {
        while self.eval_expr(&while_stmt.cond)?.as_bool()? {
            self.exec_block(&while_stmt.body, ScopeKind::Block)?;
            if self.signal != Signal::None {
                break;
            }
        }
        Ok(())
    }

    fn exec_return(&mut self, ret: &ReturnStmt) -> Result<(), RuntimeError> {
        let value = match &ret.value {
            Some(expr) => self.eval_expr(expr)?,
            None => Value::Unit,
        };
        self.signal = Signal::Return(value);
        Ok(())
    }

    /// `print` writes the display form; `show` renders all-numeric matrices
    /// one row per line and falls back to the display form otherwise.
    fn exec_print(&mut self, print: &PrintStmt) -> Result<(), RuntimeError> {
        let value = self.eval_expr(&print.expr)?;
        if print.pretty {
            if let Ok(rows) = value.number_matrix() {
                for line in matrix::render(&rows) {
                    self.out.line(line);
                }
                return Ok(());
            }
        }
        self.out.line(value.to_string());
        Ok(())
    }
}
