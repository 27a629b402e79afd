//! Docstring stripping post-pass.
//!
//! Removes free-floating string-literal expression statements (the docstring
//! convention) from statement bodies. Runs on already-assembled chunks,
//! before final text concatenation. A suite emptied by stripping is refilled
//! with `pass` so the output stays parseable.

use ruff_python_ast::{AtomicNodeIndex, Expr, ExceptHandler, Stmt, StmtPass};
use ruff_text_size::TextRange;
use thin_vec::ThinVec;

/// Whether a statement is a bare string-literal expression.
pub fn is_string_literal_stmt(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Expr(expr) if matches!(expr.value.as_ref(), Expr::StringLiteral(_)))
}

/// Strip docstrings from every suite nested inside `stmt`.
pub fn strip_docstrings(stmt: &mut Stmt) {
    match stmt {
        Stmt::FunctionDef(func) => strip_suite(&mut func.body),
        Stmt::ClassDef(class) => strip_suite(&mut class.body),
        Stmt::If(if_stmt) => {
            strip_suite(&mut if_stmt.body);
            for clause in &mut if_stmt.elif_else_clauses {
                strip_suite(&mut clause.body);
            }
        }
        Stmt::While(while_stmt) => {
            strip_suite(&mut while_stmt.body);
            strip_suite_allow_empty(&mut while_stmt.orelse);
        }
        Stmt::For(for_stmt) => {
            strip_suite(&mut for_stmt.body);
            strip_suite_allow_empty(&mut for_stmt.orelse);
        }
        Stmt::With(with_stmt) => strip_suite(&mut with_stmt.body),
        Stmt::Try(try_stmt) => {
            strip_suite(&mut try_stmt.body);
            for handler in &mut try_stmt.handlers {
                let ExceptHandler::ExceptHandler(handler) = handler;
                strip_suite(&mut handler.body);
            }
            strip_suite_allow_empty(&mut try_stmt.orelse);
            strip_suite_allow_empty(&mut try_stmt.finalbody);
        }
        Stmt::Match(match_stmt) => {
            for case in &mut match_stmt.cases {
                strip_suite(&mut case.body);
            }
        }
        _ => {}
    }
}

fn strip_suite(body: &mut ThinVec<Stmt>) {
    strip_suite_allow_empty(body);
    if body.is_empty() {
        body.push(Stmt::Pass(StmtPass {
            range: TextRange::default(),
            node_index: AtomicNodeIndex::NONE,
        }));
    }
}

fn strip_suite_allow_empty(body: &mut ThinVec<Stmt>) {
    body.retain(|stmt| !is_string_literal_stmt(stmt));
    for stmt in body.iter_mut() {
        strip_docstrings(stmt);
    }
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;

    use super::*;

    fn strip(source: &str) -> ThinVec<Stmt> {
        let parsed = parse_module(source).expect("source should parse");
        let mut body = parsed.into_syntax().body;
        body.retain(|stmt| !is_string_literal_stmt(stmt));
        for stmt in &mut body {
            strip_docstrings(stmt);
        }
        body
    }

    #[test]
    fn removes_function_docstring() {
        let body = strip(
            r#"
def f():
    "docstring"
    return 1
"#,
        );
        let Stmt::FunctionDef(func) = &body[0] else {
            panic!("expected function");
        };
        assert_eq!(func.body.len(), 1);
        assert!(matches!(func.body[0], Stmt::Return(_)));
    }

    #[test]
    fn docstring_only_body_becomes_pass() {
        let body = strip(
            r#"
def f():
    "docstring"
"#,
        );
        let Stmt::FunctionDef(func) = &body[0] else {
            panic!("expected function");
        };
        assert_eq!(func.body.len(), 1);
        assert!(matches!(func.body[0], Stmt::Pass(_)));
    }

    #[test]
    fn strips_module_and_class_docstrings() {
        let body = strip(
            r#"
"module docstring"

class C:
    "class docstring"
    x = 1
"#,
        );
        assert_eq!(body.len(), 1);
        let Stmt::ClassDef(class) = &body[0] else {
            panic!("expected class");
        };
        assert_eq!(class.body.len(), 1);
        assert!(matches!(class.body[0], Stmt::Assign(_)));
    }

    #[test]
    fn leaves_string_assignments_alone() {
        let body = strip("x = \"kept\"\n");
        assert_eq!(body.len(), 1);
        assert!(matches!(body[0], Stmt::Assign(_)));
    }
}
