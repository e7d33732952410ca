//! Expression evaluation
//!
//! Operands always evaluate left-to-right; `and`/`or` do not short-circuit,
//! so side effects in the right operand are unconditional. Out-of-range
//! index reads are recoverable (reported, result `Unit`); type mismatches
//! and division by zero are fatal.

use super::Interpreter;
use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::value::{RuntimeError, Value};

impl Interpreter {
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Variable(name) => Ok(self.scopes.lookup(name)?.clone()),
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expr(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(values))
            }
            Expr::Matrix(rows) => {
                let mut values: Vec<Vec<Value>> = Vec::with_capacity(rows.len());
                for row in rows {
                    let cells = row
                        .iter()
                        .map(|item| self.eval_expr(item))
                        .collect::<Result<Vec<_>, _>>()?;
                    if let Some(first) = values.first() {
                        if cells.len() != first.len() {
                            return Err(RuntimeError::DimensionMismatch(format!(
                                "matrix rows must have equal length, found {} and {}",
                                first.len(),
                                cells.len()
                            )));
                        }
                    }
                    values.push(cells);
                }
                Ok(Value::Matrix(values))
            }
            Expr::Unary(unary) => {
                let value = self.eval_expr(&unary.expr)?;
                match unary.op {
                    UnaryOp::Neg => Ok(Value::Number(-value.as_number()?)),
                    UnaryOp::Not => Ok(Value::Bool(!value.as_bool()?)),
                }
            }
            Expr::Binary(binary) => {
                let left = self.eval_expr(&binary.left)?;
                let right = self.eval_expr(&binary.right)?;
                eval_binary(binary.op, left, right)
            }
            Expr::Index(index) => {
                let target = self.eval_expr(&index.target)?;
                let i = self.eval_expr(&index.index)?.as_int()?;
                self.eval_index(target, i)
            }
            Expr::Index2(index2) => {
                let target = self.eval_expr(&index2.target)?;
                let row = self.eval_expr(&index2.row)?.as_int()?;
                let col = self.eval_expr(&index2.col)?.as_int()?;
                self.eval_index2(target, row, col)
            }
            Expr::Slice(slice) => {
                let target = self.eval_expr(&slice.target)?;
                let start = self.eval_expr(&slice.start)?.as_int()?;
                let end = self.eval_expr(&slice.end)?.as_int()?;
                eval_slice(target, start, end)
            }
            Expr::Call(call) => {
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.eval_expr(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.invoke(&call.name, args)
            }
        }
    }

    /// Single index: list element, matrix row, or string character.
    fn eval_index(&mut self, target: Value, index: i64) -> Result<Value, RuntimeError> {
        match target {
            Value::List(items) => match checked(index, items.len()) {
                Some(i) => Ok(items[i].clone()),
                None => {
                    self.report_index(index, items.len());
                    Ok(Value::Unit)
                }
            },
            Value::Matrix(rows) => match checked(index, rows.len()) {
                Some(i) => Ok(Value::List(rows[i].clone())),
                None => {
                    self.report_index(index, rows.len());
                    Ok(Value::Unit)
                }
            },
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                match checked(index, chars.len()) {
                    Some(i) => Ok(Value::Str(chars[i].to_string())),
                    None => {
                        self.report_index(index, chars.len());
                        Ok(Value::Unit)
                    }
                }
            }
            other => Err(RuntimeError::TypeMismatch(format!(
                "cannot index into {}",
                other.type_name()
            ))),
        }
    }

    fn eval_index2(&mut self, target: Value, row: i64, col: i64) -> Result<Value, RuntimeError> {
        let rows = match target {
            Value::Matrix(rows) => rows,
            Value::List(items) => {
                // List-of-lists counts as a matrix for reads.
                let row_value = self.eval_index(Value::List(items), row)?;
                return match row_value {
                    Value::Unit => Ok(Value::Unit),
                    other => self.eval_index(other, col),
                };
            }
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "cannot matrix-index into {}",
                    other.type_name()
                )))
            }
        };
        match checked(row, rows.len()) {
            Some(r) => {
                let cells = &rows[r];
                match checked(col, cells.len()) {
                    Some(c) => Ok(cells[c].clone()),
                    None => {
                        self.report_index(col, cells.len());
                        Ok(Value::Unit)
                    }
                }
            }
            None => {
                self.report_index(row, rows.len());
                Ok(Value::Unit)
            }
        }
    }
}

fn checked(index: i64, len: usize) -> Option<usize> {
    if index >= 0 && (index as usize) < len {
        Some(index as usize)
    } else {
        None
    }
}

/// Half-open slice with both ends clamped into range, so a slice never
/// reports an error; an inverted range yields an empty result.
fn eval_slice(target: Value, start: i64, end: i64) -> Result<Value, RuntimeError> {
    let clamp = |i: i64, len: usize| -> usize { i.clamp(0, len as i64) as usize };
    match target {
        Value::List(items) => {
            let (s, e) = (clamp(start, items.len()), clamp(end, items.len()));
            if s >= e {
                return Ok(Value::List(Vec::new()));
            }
            Ok(Value::List(items[s..e].to_vec()))
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let (s, e) = (clamp(start, chars.len()), clamp(end, chars.len()));
            if s >= e {
                return Ok(Value::Str(String::new()));
            }
            Ok(Value::Str(chars[s..e].iter().collect()))
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "cannot slice {}",
            other.type_name()
        ))),
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match op {
        // `+` concatenates as soon as either side is a string.
        BinaryOp::Add => match (&left, &right) {
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(format!("{left}{right}")))
            }
            _ => Ok(Value::Number(left.as_number()? + right.as_number()?)),
        },
        BinaryOp::Sub => Ok(Value::Number(left.as_number()? - right.as_number()?)),
        BinaryOp::Mul => Ok(Value::Number(left.as_number()? * right.as_number()?)),
        BinaryOp::Div => {
            let divisor = right.as_number()?;
            if divisor == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Number(left.as_number()? / divisor))
        }
        BinaryOp::Mod => {
            let divisor = right.as_number()?;
            if divisor == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Number(left.as_number()? % divisor))
        }
        BinaryOp::Pow => Ok(Value::Number(left.as_number()?.powf(right.as_number()?))),
        BinaryOp::Lt => Ok(Value::Bool(left.as_number()? < right.as_number()?)),
        BinaryOp::Le => Ok(Value::Bool(left.as_number()? <= right.as_number()?)),
        BinaryOp::Gt => Ok(Value::Bool(left.as_number()? > right.as_number()?)),
        BinaryOp::Ge => Ok(Value::Bool(left.as_number()? >= right.as_number()?)),
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::And => Ok(Value::Bool(left.as_bool()? && right.as_bool()?)),
        BinaryOp::Or => Ok(Value::Bool(left.as_bool()? || right.as_bool()?)),
    }
}
