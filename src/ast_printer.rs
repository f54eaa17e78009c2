//! Lisp style rendering of expression trees, mostly useful for debugging the
//! parser: `-123 * (45.67)` prints as `(* (- 123) (group 45.67))`.

use crate::ast::Expr;

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(expr) => expr.value.to_string(),
        Expr::Grouping(expr) => parenthesize("group", &[&expr.expression]),
        Expr::Unary(expr) => parenthesize(&expr.operator.lexeme, &[&expr.expression]),
        Expr::Binary(expr) => parenthesize(&expr.operator.lexeme, &[&expr.left, &expr.right]),
        Expr::Logical(expr) => parenthesize(&expr.operator.lexeme, &[&expr.left, &expr.right]),
        Expr::Variable(expr) => expr.name.lexeme.clone(),
        Expr::Assign(expr) => parenthesize(&format!("= {}", expr.name.lexeme), &[&expr.value]),
        Expr::Call(expr) => {
            let mut parts = vec![&expr.callee];
            parts.extend(expr.arguments.iter());
            parenthesize("call", &parts)
        }
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut out = String::new();
    out.push('(');
    out.push_str(name);
    for expr in exprs {
        out.push(' ');
        out.push_str(&print_expr(expr));
    }
    out.push(')');
    out
}
