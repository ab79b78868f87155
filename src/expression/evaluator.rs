use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::ast::{BinaryOperator, Expression, UnaryOperator};
use super::functions::call_builtin;
use super::parser::parse_expression;
use super::template::Template;
use super::{ExpressionError, ExpressionResult};
use crate::memory::{MemoryRead, Value};

/// Evaluates expressions against memory. Parsed sources are cached, so a single
/// evaluator should be shared across turns.
#[derive(Debug, Clone, Default)]
pub struct ExpressionEvaluator {
    expressions: Arc<DashMap<String, Arc<Expression>>>,
    templates: Arc<DashMap<String, Arc<Template>>>,
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&self, source: &str) -> ExpressionResult<Arc<Expression>> {
        if let Some(cached) = self.expressions.get(source) {
            return Ok(cached.clone());
        }
        let expression = Arc::new(parse_expression(source)?);
        self.expressions
            .insert(source.to_string(), expression.clone());
        Ok(expression)
    }

    pub fn compile_template(&self, source: &str) -> ExpressionResult<Arc<Template>> {
        if let Some(cached) = self.templates.get(source) {
            return Ok(cached.clone());
        }
        let template = Arc::new(Template::parse(source)?);
        self.templates.insert(source.to_string(), template.clone());
        Ok(template)
    }

    pub fn evaluate_source<M: MemoryRead + ?Sized>(
        &self,
        source: &str,
        memory: &M,
    ) -> ExpressionResult<Value> {
        let expression = self.compile(source)?;
        self.evaluate(&expression, memory)
    }

    pub fn evaluate_condition<M: MemoryRead + ?Sized>(
        &self,
        source: &str,
        memory: &M,
    ) -> ExpressionResult<bool> {
        Ok(self.evaluate_source(source, memory)?.is_truthy())
    }

    pub fn render_template<M: MemoryRead + ?Sized>(
        &self,
        source: &str,
        memory: &M,
    ) -> ExpressionResult<String> {
        self.compile_template(source)?.render(self, memory)
    }

    pub fn evaluate<M: MemoryRead + ?Sized>(
        &self,
        expression: &Expression,
        memory: &M,
    ) -> ExpressionResult<Value> {
        match expression {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Path(path) => Ok(memory.resolve(path)),
            Expression::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.evaluate(item, memory))
                    .collect::<ExpressionResult<Vec<_>>>()?,
            )),
            Expression::Call {
                function,
                arguments,
            } => {
                let args = arguments
                    .iter()
                    .map(|arg| self.evaluate(arg, memory))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                debug!("call {}({} args)", function, args.len());
                call_builtin(function, args)
            }
            Expression::Unary { op, operand } => {
                let operand = self.evaluate(operand, memory)?;
                eval_unary(*op, operand)
            }
            Expression::Binary { op, left, right } => match op {
                BinaryOperator::And => {
                    let left = self.evaluate(left, memory)?;
                    if !left.is_truthy() {
                        return Ok(Value::Boolean(false));
                    }
                    Ok(Value::Boolean(self.evaluate(right, memory)?.is_truthy()))
                }
                BinaryOperator::Or => {
                    let left = self.evaluate(left, memory)?;
                    if left.is_truthy() {
                        return Ok(Value::Boolean(true));
                    }
                    Ok(Value::Boolean(self.evaluate(right, memory)?.is_truthy()))
                }
                op => {
                    let left = self.evaluate(left, memory)?;
                    let right = self.evaluate(right, memory)?;
                    eval_binary(*op, left, right)
                }
            },
        }
    }
}

fn eval_unary(op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
    match (op, operand) {
        (UnaryOperator::Not, value) => Ok(Value::Boolean(!value.is_truthy())),
        (UnaryOperator::Negate, Value::Integer(i)) => Ok(match i.checked_neg() {
            Some(negated) => Value::Integer(negated),
            None => Value::Float(-(i as f64)),
        }),
        (UnaryOperator::Negate, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOperator::Negate, other) => Err(ExpressionError::TypeMismatch(format!(
            "cannot negate {}",
            other.type_name()
        ))),
    }
}

fn mismatch(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::TypeMismatch(format!(
        "unsupported operands for {}: {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn eval_binary(op: BinaryOperator, left: Value, right: Value) -> ExpressionResult<Value> {
    use std::cmp::Ordering;

    match op {
        BinaryOperator::Equal => Ok(Value::Boolean(left.loose_eq(&right))),
        BinaryOperator::NotEqual => Ok(Value::Boolean(!left.loose_eq(&right))),
        BinaryOperator::LessThan
        | BinaryOperator::LessThanEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanEqual => {
            let ordering = left
                .compare(&right)
                .ok_or_else(|| mismatch(op, &left, &right))?;
            Ok(Value::Boolean(match op {
                BinaryOperator::LessThan => ordering == Ordering::Less,
                BinaryOperator::LessThanEqual => ordering != Ordering::Greater,
                BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOperator::Add => match (&left, &right) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            (Value::List(a), Value::List(b)) => {
                Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
            }
            _ => arithmetic(op, &left, &right),
        },
        BinaryOperator::Subtract | BinaryOperator::Multiply => arithmetic(op, &left, &right),
        BinaryOperator::Divide | BinaryOperator::Modulo => {
            if right.as_f64() == Some(0.0) {
                return Err(ExpressionError::InvalidArgument {
                    function: op.to_string(),
                    message: "division by zero".to_string(),
                });
            }
            arithmetic(op, &left, &right)
        }
        BinaryOperator::And | BinaryOperator::Or => {
            Ok(Value::Boolean(left.is_truthy() && right.is_truthy()))
        }
    }
}

/// Integer arithmetic stays integral (division truncates); anything else goes through f64.
fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionResult<Value> {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        let result = match op {
            BinaryOperator::Add => a.checked_add(*b),
            BinaryOperator::Subtract => a.checked_sub(*b),
            BinaryOperator::Multiply => a.checked_mul(*b),
            BinaryOperator::Divide => a.checked_div(*b),
            BinaryOperator::Modulo => a.checked_rem(*b),
            _ => None,
        };
        if let Some(result) = result {
            return Ok(Value::Integer(result));
        }
    }
    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(mismatch(op, left, right));
    };
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => a / b,
        BinaryOperator::Modulo => a % b,
        _ => return Err(mismatch(op, left, right)),
    };
    Ok(Value::Float(result))
}
