//! Tree-walking evaluator for condition expressions.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use super::parser::{BinaryOp, Expr, UnaryOp};

/// A condition value: integer or boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
}

impl Value {
    /// Truthiness: nonzero integers and `true` are truthy.
    pub fn truthy(self) -> bool {
        match self {
            Value::Int(n) => n != 0,
            Value::Bool(b) => b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Why an evaluation aborted.
#[derive(Debug, Clone, Error)]
pub(crate) enum EvalError {
    /// An arithmetic or ordering operator saw a boolean operand.
    #[error("operator `{op}` needs integer operands, got {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: Value,
        rhs: Value,
    },
    /// Arithmetic negation of a boolean.
    #[error("cannot negate {0}")]
    NegateBool(Value),
    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Integer overflow during arithmetic.
    #[error("arithmetic overflow")]
    Overflow,
}

/// Evaluate an expression against the affinity map.
pub(crate) fn eval(expr: &Expr, affinity: &HashMap<String, i64>) -> Result<Value, EvalError> {
    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Flag(name) => Ok(Value::Int(affinity.get(name).copied().unwrap_or(0))),
        Expr::Unary { op, operand } => {
            let value = eval(operand, affinity)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                UnaryOp::Neg => match value {
                    Value::Int(n) => n
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or(EvalError::Overflow),
                    Value::Bool(_) => Err(EvalError::NegateBool(value)),
                },
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            // Short-circuit before touching the right-hand side.
            match op {
                BinaryOp::Or => {
                    let lhs = eval(lhs, affinity)?;
                    if lhs.truthy() {
                        return Ok(Value::Bool(true));
                    }
                    return Ok(Value::Bool(eval(rhs, affinity)?.truthy()));
                }
                BinaryOp::And => {
                    let lhs = eval(lhs, affinity)?;
                    if !lhs.truthy() {
                        return Ok(Value::Bool(false));
                    }
                    return Ok(Value::Bool(eval(rhs, affinity)?.truthy()));
                }
                _ => {}
            }

            let lhs = eval(lhs, affinity)?;
            let rhs = eval(rhs, affinity)?;
            match op {
                BinaryOp::Or | BinaryOp::And => unreachable!("handled above"),
                BinaryOp::Eq => equality(lhs, rhs, "==").map(Value::Bool),
                BinaryOp::Ne => equality(lhs, rhs, "!=").map(|eq| Value::Bool(!eq)),
                BinaryOp::Lt => ints(lhs, rhs, "<").map(|(a, b)| Value::Bool(a < b)),
                BinaryOp::Le => ints(lhs, rhs, "<=").map(|(a, b)| Value::Bool(a <= b)),
                BinaryOp::Gt => ints(lhs, rhs, ">").map(|(a, b)| Value::Bool(a > b)),
                BinaryOp::Ge => ints(lhs, rhs, ">=").map(|(a, b)| Value::Bool(a >= b)),
                BinaryOp::Add => {
                    let (a, b) = ints(lhs, rhs, "+")?;
                    a.checked_add(b).map(Value::Int).ok_or(EvalError::Overflow)
                }
                BinaryOp::Sub => {
                    let (a, b) = ints(lhs, rhs, "-")?;
                    a.checked_sub(b).map(Value::Int).ok_or(EvalError::Overflow)
                }
                BinaryOp::Mul => {
                    let (a, b) = ints(lhs, rhs, "*")?;
                    a.checked_mul(b).map(Value::Int).ok_or(EvalError::Overflow)
                }
                BinaryOp::Div => {
                    let (a, b) = ints(lhs, rhs, "/")?;
                    if b == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    a.checked_div(b).map(Value::Int).ok_or(EvalError::Overflow)
                }
                BinaryOp::Rem => {
                    let (a, b) = ints(lhs, rhs, "%")?;
                    if b == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    a.checked_rem(b).map(Value::Int).ok_or(EvalError::Overflow)
                }
            }
        }
    }
}

fn ints(lhs: Value, rhs: Value, op: &'static str) -> Result<(i64, i64), EvalError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok((a, b)),
        _ => Err(EvalError::TypeMismatch { op, lhs, rhs }),
    }
}

fn equality(lhs: Value, rhs: Value, op: &'static str) -> Result<bool, EvalError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        _ => Err(EvalError::TypeMismatch { op, lhs, rhs }),
    }
}
