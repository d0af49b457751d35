//! Condition expressions over affinity flags.
//!
//! Conditions are small boolean/arithmetic expressions such as
//! `f.yurina >= 2 && !f.ended`. `f.<name>` reads an affinity flag
//! (absent flags read as 0). Evaluation never fails outward: any lex,
//! parse, or evaluation problem logs a warning and yields `false`, so a
//! malformed condition can never halt playback.

mod eval;
mod lexer;
mod parser;

use std::collections::HashMap;

pub use eval::Value;
pub use lexer::{ConditionError, Token, lex};
pub use parser::{BinaryOp, Expr, UnaryOp, parse_condition};

/// Evaluate a condition source string against the affinity map.
///
/// Failures of any kind log a warning and return `false`.
pub fn evaluate_condition(source: &str, affinity: &HashMap<String, i64>) -> bool {
    let expr = match parse_condition(source) {
        Ok(expr) => expr,
        Err(err) => {
            tracing::warn!(condition = source, error = %err, "condition does not parse; treating as false");
            return false;
        }
    };
    match eval::eval(&expr, affinity) {
        Ok(value) => value.truthy(),
        Err(err) => {
            tracing::warn!(condition = source, error = %err, "condition evaluation failed; treating as false");
            false
        }
    }
}
