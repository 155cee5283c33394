//! Tree-walking evaluator: AST + context → value.
//!
//! Single-threaded and synchronous, depth-first post-order over operands
//! (spec §4.5). A per-call `Frame` tracks `recursion_depth` and
//! `iteration_count`; both are checked against configured limits on every
//! dispatch so a pathological expression fails fast instead of blowing the
//! native call stack or looping forever inside SUM/FILTER/MAP.

use std::cmp::Ordering as CmpOrdering;

use crate::ast::{Ast, BinaryOp, UnaryOp};
use crate::config::{DecimalConfig, SecurityConfig};
use crate::context::EvaluationContext;
use crate::decimal::Decimal;
use crate::error::{Error, Result};
use crate::functions::{resolve_index, to_index, FunctionLibrary};
use crate::value::Value;

#[derive(Debug, Default)]
struct Frame {
    recursion_depth: usize,
    iteration_count: usize,
}

pub struct Evaluator<'a> {
    functions: &'a FunctionLibrary,
    division_scale: u32,
    division_rounding: crate::decimal::RoundingMode,
    max_recursion_depth: usize,
    max_iterations: usize,
    max_exponent: i64,
    min_exponent: i64,
    max_precision: u32,
}

impl<'a> Evaluator<'a> {
    pub fn new(functions: &'a FunctionLibrary, decimal: &DecimalConfig, security: &SecurityConfig) -> Self {
        Evaluator {
            functions,
            division_scale: decimal.division_scale,
            division_rounding: decimal.rounding_mode,
            max_recursion_depth: security.max_recursion_depth,
            max_iterations: security.max_iterations,
            max_exponent: decimal.max_exponent,
            min_exponent: decimal.min_exponent,
            max_precision: decimal.precision,
        }
    }

    /// Checks an arithmetic result against the configured exponent/precision
    /// bounds, raising `DecimalOverflow`/`DecimalUnderflow` the way a real
    /// bignum implementation would on an out-of-range result.
    fn bound(&self, d: Decimal) -> Result<Decimal> {
        Ok(d.enforce_bounds(self.max_exponent, self.min_exponent, self.max_precision)?)
    }

    pub fn evaluate(&self, ast: &Ast, ctx: &mut EvaluationContext) -> Result<Value> {
        let mut frame = Frame::default();
        self.eval_node(ast, ctx, &mut frame)
    }

    fn eval_node(&self, ast: &Ast, ctx: &mut EvaluationContext, frame: &mut Frame) -> Result<Value> {
        frame.recursion_depth += 1;
        if frame.recursion_depth > self.max_recursion_depth {
            return Err(Error::MaxRecursion { limit: self.max_recursion_depth });
        }
        let result = self.eval_node_inner(ast, ctx, frame);
        frame.recursion_depth -= 1;
        result
    }

    fn eval_node_inner(&self, ast: &Ast, ctx: &mut EvaluationContext, frame: &mut Frame) -> Result<Value> {
        match ast {
            Ast::DecimalLiteral { text } => Ok(Value::decimal(Decimal::from_text(text).map_err(Error::from)?)),
            Ast::FloatLiteral { value } => Ok(Value::Float(*value)),
            Ast::StringLiteral { value } => Ok(Value::string(value.clone())),
            Ast::BooleanLiteral { value } => Ok(Value::Bool(*value)),
            Ast::NullLiteral => Ok(Value::Null),
            Ast::ArrayLiteral { elements } => {
                let mut out = Vec::with_capacity(elements.len());
                for e in elements {
                    out.push(self.eval_node(e, ctx, frame)?);
                }
                Ok(Value::Array(out))
            }
            Ast::ObjectLiteral { properties } => {
                let mut out = indexmap::IndexMap::with_capacity(properties.len());
                for (key, value) in properties {
                    out.insert(key.clone(), self.eval_node(value, ctx, frame)?);
                }
                Ok(Value::Object(out))
            }
            Ast::VariableReference { prefix, name } => ctx.resolve(*prefix, name),
            Ast::UnaryOperation { op, operand } => {
                let value = self.eval_node(operand, ctx, frame)?;
                self.eval_unary(*op, value)
            }
            Ast::BinaryOperation { op, left, right } => self.eval_binary(*op, left, right, ctx, frame),
            Ast::ConditionalExpression { cond, then_branch, else_branch } => {
                let cond = self.eval_node(cond, ctx, frame)?;
                if cond.to_bool() {
                    self.eval_node(then_branch, ctx, frame)
                } else {
                    self.eval_node(else_branch, ctx, frame)
                }
            }
            Ast::FunctionCall { name, arguments } => self.eval_call(name, arguments, ctx, frame),
            Ast::MemberAccess { object, property } => {
                let object = self.eval_node(object, ctx, frame)?;
                self.eval_member(object, property, ctx.is_strict())
            }
            Ast::IndexAccess { object, index } => {
                let object = self.eval_node(object, ctx, frame)?;
                let index = self.eval_node(index, ctx, frame)?;
                self.eval_index(object, index, ctx.is_strict())
            }
        }
    }

    fn eval_unary(&self, op: UnaryOp, value: Value) -> Result<Value> {
        match op {
            UnaryOp::Neg => {
                let d = value.to_decimal().map_err(|_| Error::InvalidOperation {
                    op: "-".into(),
                    operand_types: vec![value.type_name().into()],
                })?;
                Ok(Value::decimal(self.bound(d.neg())?))
            }
            UnaryOp::Not => Ok(Value::Bool(!value.to_bool())),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left_ast: &Ast,
        right_ast: &Ast,
        ctx: &mut EvaluationContext,
        frame: &mut Frame,
    ) -> Result<Value> {
        // && and || short-circuit: the right AST must not be evaluated (and
        // must not raise UndefinedVariable) when the left operand already
        // decides the result.
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let left = self.eval_node(left_ast, ctx, frame)?;
            let left_bool = left.to_bool();
            if op == BinaryOp::And && !left_bool {
                return Ok(Value::Bool(false));
            }
            if op == BinaryOp::Or && left_bool {
                return Ok(Value::Bool(true));
            }
            let right = self.eval_node(right_ast, ctx, frame)?;
            return Ok(Value::Bool(right.to_bool()));
        }

        let left = self.eval_node(left_ast, ctx, frame)?;
        let right = self.eval_node(right_ast, ctx, frame)?;

        match op {
            BinaryOp::Add => self.eval_add(left, right),
            BinaryOp::Sub => {
                let (a, b) = self.numeric_pair("-", &left, &right)?;
                Ok(Value::decimal(self.bound(a.sub(b))?))
            }
            BinaryOp::Mul => {
                let (a, b) = self.numeric_pair("*", &left, &right)?;
                Ok(Value::decimal(self.bound(a.mul(b))?))
            }
            BinaryOp::Div => {
                let (a, b) = self.numeric_pair("/", &left, &right)?;
                if b.is_zero() {
                    return Err(Error::DivisionByZero);
                }
                Ok(Value::decimal(self.bound(a.div(b, self.division_scale, self.division_rounding)?)?))
            }
            BinaryOp::Mod => {
                let (a, b) = self.numeric_pair("%", &left, &right)?;
                if b.is_zero() {
                    return Err(Error::DivisionByZero);
                }
                Ok(Value::decimal(self.bound(a.rem(b)?)?))
            }
            BinaryOp::Pow => {
                let (a, b) = self.numeric_pair("^", &left, &right)?;
                Ok(Value::decimal(self.bound(a.pow(b)?)?))
            }
            BinaryOp::Eq => Ok(Value::Bool(values_equal_for_operator(&left, &right))),
            BinaryOp::NotEq => Ok(Value::Bool(!values_equal_for_operator(&left, &right))),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => self.eval_relational(op, left, right),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above via short-circuit"),
        }
    }

    fn eval_add(&self, left: Value, right: Value) -> Result<Value> {
        if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
            return Ok(Value::string(format!("{}{}", left.stringify(), right.stringify())));
        }
        let (a, b) = self.numeric_pair("+", &left, &right)?;
        Ok(Value::decimal(self.bound(a.add(b))?))
    }

    fn numeric_pair(&self, op: &str, left: &Value, right: &Value) -> Result<(Decimal, Decimal)> {
        let operand_types = vec![left.type_name().to_string(), right.type_name().to_string()];
        let a = left.to_decimal().map_err(|_| Error::InvalidOperation {
            op: op.to_string(),
            operand_types: operand_types.clone(),
        })?;
        let b = right.to_decimal().map_err(|_| Error::InvalidOperation {
            op: op.to_string(),
            operand_types,
        })?;
        Ok((a, b))
    }

    fn eval_relational(&self, op: BinaryOp, left: Value, right: Value) -> Result<Value> {
        let ord = if left.is_numeric() && right.is_numeric() {
            let a = left.to_decimal().expect("checked numeric");
            let b = right.to_decimal().expect("checked numeric");
            a.cmp3(b)
        } else if let (Value::String(a), Value::String(b)) = (&left, &right) {
            a.cmp(b)
        } else {
            return Err(Error::InvalidOperation {
                op: relational_symbol(op).to_string(),
                operand_types: vec![left.type_name().to_string(), right.type_name().to_string()],
            });
        };
        let result = match op {
            BinaryOp::Lt => ord == CmpOrdering::Less,
            BinaryOp::LtEq => ord != CmpOrdering::Greater,
            BinaryOp::Gt => ord == CmpOrdering::Greater,
            BinaryOp::GtEq => ord != CmpOrdering::Less,
            _ => unreachable!(),
        };
        Ok(Value::Bool(result))
    }

    fn eval_member(&self, object: Value, property: &str, strict: bool) -> Result<Value> {
        match object {
            Value::Null if strict => Err(Error::PropertyAccess {
                property: property.to_string(),
                object_type: "null".to_string(),
            }),
            Value::Null => Ok(Value::Null),
            Value::Object(map) => Ok(map.get(property).cloned().unwrap_or(Value::Null).auto_decimal()),
            other => Err(Error::PropertyAccess {
                property: property.to_string(),
                object_type: other.type_name().to_string(),
            }),
        }
    }

    fn eval_index(&self, object: Value, index: Value, strict: bool) -> Result<Value> {
        match object {
            Value::Null if strict => Err(Error::IndexAccess {
                index: index.stringify(),
                object_type: "null".to_string(),
            }),
            Value::Null => Ok(Value::Null),
            Value::Array(arr) => {
                let Some(i) = to_index(&index) else {
                    return Err(Error::IndexAccess {
                        index: index.stringify(),
                        object_type: "array".to_string(),
                    });
                };
                Ok(resolve_index(i, arr.len())
                    .map(|i| arr[i].clone())
                    .unwrap_or(Value::Null)
                    .auto_decimal())
            }
            Value::Object(map) => {
                let key = index.stringify();
                Ok(map.get(&key).cloned().unwrap_or(Value::Null).auto_decimal())
            }
            other => Err(Error::IndexAccess {
                index: index.stringify(),
                object_type: other.type_name().to_string(),
            }),
        }
    }

    fn eval_call(&self, name: &str, arguments: &[Ast], ctx: &mut EvaluationContext, frame: &mut Frame) -> Result<Value> {
        match name {
            "SUM" if arguments.len() == 2 => return self.eval_sum2(arguments, ctx, frame),
            "FILTER" if arguments.len() == 2 => return self.eval_filter(arguments, ctx, frame),
            "MAP" if arguments.len() == 2 => return self.eval_map(arguments, ctx, frame),
            _ => {}
        }
        let mut values = Vec::with_capacity(arguments.len());
        for arg in arguments {
            values.push(self.eval_node(arg, ctx, frame)?);
        }
        self.functions.call(name, &values)
    }

    fn eval_iterable(&self, arguments: &[Ast], ctx: &mut EvaluationContext, frame: &mut Frame) -> Result<Vec<Value>> {
        match self.eval_node(&arguments[0], ctx, frame)? {
            Value::Array(items) => Ok(items),
            other => Err(Error::TypeMismatch {
                expected: "array".into(),
                actual: other.type_name().into(),
                where_: "iterating function first argument".into(),
            }),
        }
    }

    fn eval_sum2(&self, arguments: &[Ast], ctx: &mut EvaluationContext, frame: &mut Frame) -> Result<Value> {
        let items = self.eval_iterable(arguments, ctx, frame)?;
        let mut total = Decimal::ZERO;
        for item in items {
            self.bump_iterations(frame)?;
            let mut child = ctx.with_iteration_var("it", item);
            let value = self.eval_node(&arguments[1], &mut child, frame)?;
            ctx.merge_accessed(&mut child);
            total = total.add(value.to_decimal().map_err(|_| Error::TypeMismatch {
                expected: "numeric".into(),
                actual: value.type_name().into(),
                where_: "SUM iteration result".into(),
            })?);
        }
        Ok(Value::decimal(total))
    }

    fn eval_filter(&self, arguments: &[Ast], ctx: &mut EvaluationContext, frame: &mut Frame) -> Result<Value> {
        let items = self.eval_iterable(arguments, ctx, frame)?;
        let mut out = Vec::new();
        for item in items {
            self.bump_iterations(frame)?;
            let mut child = ctx.with_iteration_var("it", item.clone());
            let keep = self.eval_node(&arguments[1], &mut child, frame)?;
            ctx.merge_accessed(&mut child);
            if keep.to_bool() {
                out.push(item);
            }
        }
        Ok(Value::Array(out))
    }

    fn eval_map(&self, arguments: &[Ast], ctx: &mut EvaluationContext, frame: &mut Frame) -> Result<Value> {
        let items = self.eval_iterable(arguments, ctx, frame)?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            self.bump_iterations(frame)?;
            let mut child = ctx.with_iteration_var("it", item);
            let mapped = self.eval_node(&arguments[1], &mut child, frame)?;
            ctx.merge_accessed(&mut child);
            out.push(mapped);
        }
        Ok(Value::Array(out))
    }

    fn bump_iterations(&self, frame: &mut Frame) -> Result<()> {
        frame.iteration_count += 1;
        if frame.iteration_count > self.max_iterations {
            return Err(Error::MaxIterations { limit: self.max_iterations });
        }
        Ok(())
    }
}

fn relational_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        _ => unreachable!(),
    }
}

/// `==`/`!=` semantics (spec §4.5): numeric compares numerically; `Null ==
/// Null`; arrays/objects compare by identity (never equal, since this
/// evaluator holds no identity concept for freshly-computed values) rather
/// than structurally; everything else falls back to Value's derived
/// structural equality (which already yields `false` across variants).
fn values_equal_for_operator(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(_), _) | (_, Value::Array(_)) | (Value::Object(_), _) | (_, Value::Object(_)) => false,
        (Value::Null, Value::Null) => true,
        _ if left.is_numeric() && right.is_numeric() => left.to_decimal().ok() == right.to_decimal().ok(),
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn eval(src: &str, ctx: &mut EvaluationContext) -> Result<Value> {
        let lib = FunctionLibrary::new();
        let evaluator = Evaluator::new(&lib, &DecimalConfig::default(), &SecurityConfig::default());
        evaluator.evaluate(&parse(src).unwrap(), ctx)
    }

    #[test]
    fn decimal_exactness_matches_testable_property_6() {
        let mut ctx = EvaluationContext::new();
        assert_eq!(eval("0.1 + 0.2", &mut ctx).unwrap(), Value::decimal(Decimal::from_text("0.3").unwrap()));
        assert_eq!(
            eval("1000.10 - 1000.00", &mut ctx).unwrap(),
            Value::decimal(Decimal::from_text("0.10").unwrap())
        );
        assert_eq!(eval("19.99 * 3", &mut ctx).unwrap(), Value::decimal(Decimal::from_text("59.97").unwrap()));
    }

    #[test]
    fn short_circuit_and_avoids_undefined_variable() {
        let mut ctx = EvaluationContext::new();
        assert_eq!(eval("false && $undef", &mut ctx).unwrap(), Value::Bool(false));
        assert_eq!(eval("true || $undef", &mut ctx).unwrap(), Value::Bool(true));
    }

    #[test]
    fn ternary_and_nested_member_access_match_s5() {
        let mut ctx = EvaluationContext::new();
        ctx.set_variable("score", Value::decimal(Decimal::from_i64(85)));
        let result = eval(r#"$score>=90?"A":($score>=80?"B":"C")"#, &mut ctx).unwrap();
        assert_eq!(result, Value::string("B"));

        let mut nested = indexmap::IndexMap::new();
        let mut address = indexmap::IndexMap::new();
        address.insert("city".to_string(), Value::string("NY"));
        nested.insert("address".to_string(), Value::Object(address));
        let mut ctx2 = EvaluationContext::new();
        ctx2.set_variable("customer", Value::Object(nested));
        assert_eq!(eval("$customer.address.city", &mut ctx2).unwrap(), Value::string("NY"));
    }

    #[test]
    fn division_by_zero_is_reported() {
        let mut ctx = EvaluationContext::new();
        ctx.set_variable("a", Value::decimal(Decimal::from_i64(10)));
        ctx.set_variable("b", Value::decimal(Decimal::ZERO));
        assert!(matches!(eval("$a / $b", &mut ctx), Err(Error::DivisionByZero)));
    }

    #[test]
    fn filter_and_map_bind_it_in_a_child_scope() {
        let mut ctx = EvaluationContext::new();
        ctx.set_variable(
            "arr",
            Value::Array(vec![
                Value::decimal(Decimal::from_i64(1)),
                Value::decimal(Decimal::from_i64(2)),
                Value::decimal(Decimal::from_i64(3)),
            ]),
        );
        let filtered = eval("FILTER($arr, $it > 1)", &mut ctx).unwrap();
        assert_eq!(
            filtered,
            Value::Array(vec![Value::decimal(Decimal::from_i64(2)), Value::decimal(Decimal::from_i64(3))])
        );
        let mapped = eval("MAP($arr, $it * 2)", &mut ctx).unwrap();
        assert_eq!(
            mapped,
            Value::Array(vec![
                Value::decimal(Decimal::from_i64(2)),
                Value::decimal(Decimal::from_i64(4)),
                Value::decimal(Decimal::from_i64(6)),
            ])
        );
        assert!(ctx.get_variable("it").is_none());
    }

    #[test]
    fn sum_two_arg_form_uses_it_binding() {
        let mut ctx = EvaluationContext::new();
        ctx.set_variable(
            "arr",
            Value::Array(vec![Value::decimal(Decimal::from_i64(1)), Value::decimal(Decimal::from_i64(2))]),
        );
        let result = eval("SUM($arr, $it * 10)", &mut ctx).unwrap();
        assert_eq!(result, Value::decimal(Decimal::from_i64(30)));
    }

    #[test]
    fn array_index_out_of_range_is_null_not_an_error() {
        let mut ctx = EvaluationContext::new();
        ctx.set_variable("arr", Value::Array(vec![Value::decimal(Decimal::from_i64(1))]));
        assert_eq!(eval("$arr[5]", &mut ctx).unwrap(), Value::Null);
        assert_eq!(eval("$arr[-1]", &mut ctx).unwrap(), Value::Null);
    }

    #[test]
    fn iteration_binds_current_item_on_extra_for_library_hooks() {
        let mut ctx = EvaluationContext::new();
        ctx.set_variable("arr", Value::Array(vec![Value::decimal(Decimal::from_i64(7))]));
        let mapped = eval("MAP($arr, @_currentItem)", &mut ctx).unwrap();
        assert_eq!(mapped, Value::Array(vec![Value::decimal(Decimal::from_i64(7))]));
    }

    #[test]
    fn arithmetic_result_outside_configured_exponent_bounds_overflows() {
        let lib = FunctionLibrary::new();
        let decimal = DecimalConfig {
            max_exponent: 3,
            ..DecimalConfig::default()
        };
        let evaluator = Evaluator::new(&lib, &decimal, &SecurityConfig::default());
        let mut ctx = EvaluationContext::new();
        let err = evaluator.evaluate(&parse("9999 * 9999").unwrap(), &mut ctx).unwrap_err();
        assert!(matches!(err, Error::DecimalOverflow));
    }
}
