//! Property tests for evaluator invariants
//!
//! The core invariant: after any run — successful, aborted by a fatal
//! error, or cut short by a return — the scope chain is back to the global
//! frame alone and the call stack is empty.

use minerva_runtime::ast::{
    Assign, AssignTarget, Block, Declare, Expr, ForIter, ForStmt, FunctionDef, IfStmt, PrintStmt,
    Program, ReturnStmt, Stmt,
};
use minerva_runtime::{Interpreter, Output};
use proptest::prelude::*;

fn leaf_stmt() -> impl Strategy<Value = Stmt> {
    prop_oneof![
        (-100.0f64..100.0).prop_map(|n| Stmt::Declare(Declare {
            global: false,
            name: "x".to_string(),
            init: Expr::Number(n),
        })),
        (-100.0f64..100.0).prop_map(|n| Stmt::Assign(Assign {
            target: AssignTarget::Name("x".to_string()),
            value: Expr::Number(n),
        })),
        Just(Stmt::Print(PrintStmt {
            pretty: false,
            expr: Expr::var("x"),
        })),
        // Reads an undefined name: a fatal error mid-tree.
        Just(Stmt::Print(PrintStmt {
            pretty: false,
            expr: Expr::var("ghost"),
        })),
        (-100.0f64..100.0).prop_map(|n| Stmt::Return(ReturnStmt {
            value: Some(Expr::Number(n)),
        })),
    ]
}

fn stmt_strategy() -> impl Strategy<Value = Stmt> {
    leaf_stmt().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|stmts| Stmt::Block(Block::new(stmts))),
            (any::<bool>(), prop::collection::vec(inner.clone(), 0..3)).prop_map(
                |(cond, stmts)| Stmt::If(IfStmt {
                    cond: Expr::Bool(cond),
                    then_block: Block::new(stmts),
                    elif_branches: Vec::new(),
                    else_block: None,
                })
            ),
            (1i64..4, prop::collection::vec(inner.clone(), 0..3)).prop_map(|(stop, stmts)| {
                Stmt::For(ForStmt {
                    var: "i".to_string(),
                    iter: ForIter::Range {
                        start: None,
                        stop: Expr::Number(stop as f64),
                        step: None,
                    },
                    body: Block::new(stmts),
                })
            }),
            prop::collection::vec(inner, 0..3).prop_map(|stmts| {
                Stmt::Block(Block::new(vec![
                    Stmt::FunctionDef(FunctionDef {
                        name: "helper".to_string(),
                        params: vec!["a".to_string()],
                        body: Block::new(stmts),
                    }),
                    Stmt::Expr(Expr::call("helper", vec![Expr::Number(1.0)])),
                ]))
            }),
        ]
    })
}

proptest! {
    #[test]
    fn scopes_and_calls_balance_after_any_run(statements in prop::collection::vec(stmt_strategy(), 0..8)) {
        let mut interpreter = Interpreter::with_output(Output::capture());
        interpreter.define_global("x", minerva_runtime::Value::Number(0.0));

        // Fatal errors are allowed; imbalance is not.
        let _ = interpreter.run(&Program::new(statements));

        prop_assert_eq!(interpreter.scope_depth(), 0);
        prop_assert_eq!(interpreter.call_depth(), 0);
    }
}

#[test]
fn fatal_error_deep_in_nested_scopes_still_unwinds_cleanly() {
    let mut interpreter = Interpreter::with_output(Output::capture());
    let program = Program::new(vec![Stmt::Block(Block::new(vec![Stmt::For(ForStmt {
        var: "i".to_string(),
        iter: ForIter::Range {
            start: None,
            stop: Expr::Number(3.0),
            step: None,
        },
        body: Block::new(vec![Stmt::Print(PrintStmt {
            pretty: false,
            expr: Expr::var("ghost"),
        })]),
    })]))]);

    assert!(interpreter.run(&program).is_err());
    assert_eq!(interpreter.scope_depth(), 0);
    assert_eq!(interpreter.call_depth(), 0);
}
