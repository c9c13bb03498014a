use crate::environment::{EnvError, Environment};
use crate::primitives::{self, Arity, Builtin};
use crate::types::Expression;
use thiserror::Error;
use tracing::{debug, trace};

// --- Evaluation Error ---
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Lookup(#[from] EnvError), // Errors from environment lookup
    #[error("invalid expression: {0}")]
    InvalidExpression(String), // Empty list, non-symbol head or unknown procedure
    #[error("'{form}' expects {expected} arguments, got {found}")]
    BadArgumentCount {
        form: String,
        expected: Arity,
        found: usize,
    },
    #[error("'{form}' expects {expected} for argument {position}, got {found}")]
    BadArgumentType {
        form: String,
        position: usize,
        expected: &'static str,
        found: String,
    },
}

// Result type alias for convenience
pub type EvalResult<T = Expression> = Result<T, EvalError>;

const SPECIAL_FORMS: &[&str] = &["define", "begin", "if"];

// Bound in every fresh environment and protected from `define`.
const BUILTIN_CONSTANTS: &[&str] = &["pi"];

/// True for every special form and operator name.
pub fn is_reserved(name: &str) -> bool {
    SPECIAL_FORMS.contains(&name) || primitives::lookup(name).is_some()
}

/// Names that can never be rebound, for completion and diagnostics.
pub fn reserved_identifiers() -> impl Iterator<Item = &'static str> {
    SPECIAL_FORMS
        .iter()
        .copied()
        .chain(primitives::BUILTINS.iter().map(|builtin| builtin.name))
}

// --- Evaluate Function ---

/// Evaluates an expression in the given environment. `define` forms bind
/// into `env`.
pub fn evaluate(expr: &Expression, env: &mut Environment) -> EvalResult {
    match expr {
        // Reserved symbols evaluate to themselves
        Expression::Symbol(name) if !is_reserved(name) => Ok(env.get(name)?),
        Expression::List(children) => evaluate_list(children, env),
        Expression::None | Expression::Bool(_) | Expression::Number(_) | Expression::Symbol(_) => {
            Ok(expr.clone())
        }
    }
}

fn evaluate_list(children: &[Expression], env: &mut Environment) -> EvalResult {
    match children {
        [] => Err(EvalError::InvalidExpression(
            "cannot evaluate an empty list".to_string(),
        )),
        // Single-element lists collapse: (4) -> 4, (pi) -> pi
        [only] => evaluate(only, env),
        [Expression::Symbol(head), operands @ ..] => {
            trace!(form = %head, operands = operands.len(), "evaluating form");
            match head.as_str() {
                "define" => evaluate_define(operands, env),
                "begin" => evaluate_begin(operands, env),
                "if" => evaluate_if(operands, env),
                name => match primitives::lookup(name) {
                    Some(builtin) => evaluate_builtin(builtin, operands, env),
                    None => Err(EvalError::InvalidExpression(format!(
                        "unknown procedure '{}'",
                        name
                    ))),
                },
            }
        }
        [head, ..] => Err(EvalError::InvalidExpression(format!(
            "expected a procedure name but found {} '{}'",
            head.type_name(),
            head
        ))),
    }
}

fn evaluate_builtin(
    builtin: &Builtin,
    operands: &[Expression],
    env: &mut Environment,
) -> EvalResult {
    builtin.arity.check(builtin.name, operands.len())?;

    // Evaluate the operands left to right
    let mut evaluated_args = Vec::with_capacity(operands.len());
    for operand in operands {
        evaluated_args.push(evaluate(operand, env)?);
    }

    (builtin.func)(evaluated_args)
}

fn evaluate_define(operands: &[Expression], env: &mut Environment) -> EvalResult {
    Arity::Exactly(2).check("define", operands.len())?;

    let name = match operands[0].as_symbol() {
        Some(name) if is_reserved(name) || BUILTIN_CONSTANTS.contains(&name) => {
            return Err(EvalError::BadArgumentType {
                form: "define".to_string(),
                position: 1,
                expected: "an unreserved symbol",
                found: format!("reserved symbol '{}'", name),
            });
        }
        Some(name) => name,
        None => {
            return Err(EvalError::BadArgumentType {
                form: "define".to_string(),
                position: 1,
                expected: "symbol",
                found: operands[0].type_name().to_string(),
            });
        }
    };

    let value = evaluate(&operands[1], env)?;
    debug!(symbol = %name, value = %value, "define");
    env.set(name, value.clone());
    Ok(value)
}

fn evaluate_begin(operands: &[Expression], env: &mut Environment) -> EvalResult {
    Arity::AtLeast(1).check("begin", operands.len())?;

    let mut result = Expression::None;
    for operand in operands {
        result = evaluate(operand, env)?;
    }
    Ok(result)
}

fn evaluate_if(operands: &[Expression], env: &mut Environment) -> EvalResult {
    Arity::Exactly(3).check("if", operands.len())?;

    // Only the selected branch is evaluated.
    match evaluate(&operands[0], env)? {
        Expression::Bool(true) => evaluate(&operands[1], env),
        Expression::Bool(false) => evaluate(&operands[2], env),
        other => Err(EvalError::BadArgumentType {
            form: "if".to_string(),
            position: 1,
            expected: "boolean",
            found: other.type_name().to_string(),
        }),
    }
}
