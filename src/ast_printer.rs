use crate::expr::*;

/// Fully parenthesised prefix form, e.g. `(* (- 123) (group 45.67))`.
pub fn ast_to_string(expr: &Expr) -> String {
    match expr {
        Expr::Assign { name, value } => format!("(= {} {})", name.lexeme, ast_to_string(value)),
        Expr::Binary {
            left,
            operator,
            right,
        } => parenthesize(&operator.lexeme, &[left.as_ref(), right.as_ref()]),
        Expr::Call {
            callee, arguments, ..
        } => {
            let mut exprs: Vec<&Expr> = Vec::with_capacity(arguments.len() + 1);
            exprs.push(callee);
            exprs.extend(arguments.iter());
            parenthesize("call", &exprs)
        }
        Expr::Grouping(expr) => parenthesize("group", &[expr.as_ref()]),
        Expr::Literal(literal) => literal.to_string(),
        Expr::Logical {
            left,
            operator,
            right,
        } => parenthesize(&operator.lexeme, &[left.as_ref(), right.as_ref()]),
        Expr::Ternary {
            condition,
            then_branch,
            else_branch,
            ..
        } => parenthesize(
            "?:",
            &[condition.as_ref(), then_branch.as_ref(), else_branch.as_ref()],
        ),
        Expr::Unary { operator, right } => parenthesize(&operator.lexeme, &[right.as_ref()]),
        Expr::Variable { name } => name.lexeme.clone(),
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut builder = String::with_capacity(2 + exprs.len() * 2);
    builder.push('(');
    builder.push_str(name);
    for expr in exprs {
        builder.push(' ');
        builder.push_str(&ast_to_string(expr));
    }
    builder.push(')');
    builder
}

/// Reverse Polish notation: `(1 + 2) * (4 - 3)` becomes `1 2 + 4 3 - *`.
///
/// Unary minus is written `~` so it can't be mistaken for subtraction.
pub fn rpn(expr: &Expr) -> String {
    match expr {
        Expr::Assign { name, value } => format!("{} {} =", name.lexeme, rpn(value)),
        Expr::Binary {
            left,
            operator,
            right,
        }
        | Expr::Logical {
            left,
            operator,
            right,
        } => format!("{} {} {}", rpn(left), rpn(right), operator.lexeme),
        Expr::Call {
            callee, arguments, ..
        } => {
            let mut builder = rpn(callee);
            for argument in arguments {
                builder.push(' ');
                builder.push_str(&rpn(argument));
            }
            builder.push_str(&format!(" call/{}", arguments.len()));
            builder
        }
        Expr::Grouping(expr) => rpn(expr),
        Expr::Literal(literal) => literal.to_string(),
        Expr::Ternary {
            condition,
            then_branch,
            else_branch,
            ..
        } => format!("{} {} {} ?:", rpn(condition), rpn(then_branch), rpn(else_branch)),
        Expr::Unary { operator, right } => match operator.lexeme.as_str() {
            "-" => format!("{} ~", rpn(right)),
            op => format!("{} {}", rpn(right), op),
        },
        Expr::Variable { name } => name.lexeme.clone(),
    }
}
