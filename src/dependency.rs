//! Walks an AST to collect the `$`-variable names it references.

use std::collections::HashSet;

use crate::ast::{Ast, VariablePrefix};

/// Collect the set of `$`-variable names an expression references.
///
/// `@`-variables are never collected (external context). For member/index
/// access chains only the root variable is collected, though bracket index
/// sub-expressions are recursed into in full — `$x.a[$b]` yields `{x, b}`.
pub fn extract_dependencies(ast: &Ast) -> HashSet<String> {
    let mut out = HashSet::new();
    walk(ast, &mut out);
    out
}

fn walk(ast: &Ast, out: &mut HashSet<String>) {
    match ast {
        Ast::DecimalLiteral { .. }
        | Ast::FloatLiteral { .. }
        | Ast::StringLiteral { .. }
        | Ast::BooleanLiteral { .. }
        | Ast::NullLiteral => {}
        Ast::ArrayLiteral { elements } => {
            for e in elements {
                walk(e, out);
            }
        }
        Ast::ObjectLiteral { properties } => {
            for (_key, value) in properties {
                walk(value, out);
            }
        }
        Ast::VariableReference { prefix, name } => {
            if *prefix == VariablePrefix::Dollar {
                out.insert(name.clone());
            }
        }
        Ast::UnaryOperation { operand, .. } => walk(operand, out),
        Ast::BinaryOperation { left, right, .. } => {
            walk(left, out);
            walk(right, out);
        }
        Ast::ConditionalExpression {
            cond,
            then_branch,
            else_branch,
        } => {
            walk(cond, out);
            walk(then_branch, out);
            walk(else_branch, out);
        }
        Ast::FunctionCall { arguments, .. } => {
            for a in arguments {
                walk(a, out);
            }
        }
        Ast::MemberAccess { object, .. } => {
            // Only the root of the chain matters; `property` is never a variable.
            walk(object, out);
        }
        Ast::IndexAccess { object, index } => {
            walk(object, out);
            walk(index, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn deps(src: &str) -> HashSet<String> {
        extract_dependencies(&parse(src).unwrap())
    }

    #[test]
    fn excludes_context_variables() {
        let d = deps("$a + @b");
        assert_eq!(d, HashSet::from(["a".to_string()]));
    }

    #[test]
    fn member_and_index_chain() {
        let d = deps("$x.a[$b]");
        assert_eq!(d, HashSet::from(["x".to_string(), "b".to_string()]));
    }

    #[test]
    fn nested_object_and_function_args() {
        let d = deps(r#"SUM({a: $p, b: $q}.a, $it * 2)"#);
        assert_eq!(
            d,
            HashSet::from(["p".to_string(), "q".to_string(), "it".to_string()])
        );
    }
}
