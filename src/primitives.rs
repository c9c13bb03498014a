use std::fmt;

use crate::evaluator::{EvalError, EvalResult};
use crate::types::Expression;

pub type PrimitiveFunc = fn(Vec<Expression>) -> EvalResult;

/// How many operands (not counting the head symbol) a form accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn check(self, name: &str, found: usize) -> Result<(), EvalError> {
        let ok = match self {
            Arity::Exactly(n) => found == n,
            Arity::AtLeast(n) => found >= n,
            Arity::Between(min, max) => (min..=max).contains(&found),
        };
        if ok {
            Ok(())
        } else {
            Err(EvalError::BadArgumentCount {
                form: name.to_string(),
                expected: self,
                found,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Between(min, max) => write!(f, "between {} and {}", min, max),
        }
    }
}

/// A built-in operator. Operands are evaluated before `func` is called.
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub func: PrimitiveFunc,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

pub const BUILTINS: &[Builtin] = &[
    Builtin { name: "not", arity: Arity::Exactly(1), func: prim_not },
    Builtin { name: "and", arity: Arity::AtLeast(2), func: prim_and },
    Builtin { name: "or", arity: Arity::AtLeast(2), func: prim_or },
    Builtin { name: "<", arity: Arity::Exactly(2), func: prim_less_than },
    Builtin { name: "<=", arity: Arity::Exactly(2), func: prim_less_than_or_equals },
    Builtin { name: ">", arity: Arity::Exactly(2), func: prim_greater_than },
    Builtin { name: ">=", arity: Arity::Exactly(2), func: prim_greater_than_or_equals },
    Builtin { name: "=", arity: Arity::Exactly(2), func: prim_equals },
    Builtin { name: "+", arity: Arity::AtLeast(2), func: prim_add },
    Builtin { name: "-", arity: Arity::Between(1, 2), func: prim_sub },
    Builtin { name: "*", arity: Arity::AtLeast(2), func: prim_mul },
    Builtin { name: "/", arity: Arity::Exactly(2), func: prim_div },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

fn expect_number(expr: &Expression, name: &str, position: usize) -> Result<f64, EvalError> {
    match expr {
        Expression::Number(n) => Ok(*n),
        other => Err(EvalError::BadArgumentType {
            form: name.to_string(),
            position,
            expected: "number",
            found: other.type_name().to_string(),
        }),
    }
}

fn expect_bool(expr: &Expression, name: &str, position: usize) -> Result<bool, EvalError> {
    match expr {
        Expression::Bool(b) => Ok(*b),
        other => Err(EvalError::BadArgumentType {
            form: name.to_string(),
            position,
            expected: "boolean",
            found: other.type_name().to_string(),
        }),
    }
}

fn numbers(args: &[Expression], name: &str) -> Result<Vec<f64>, EvalError> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| expect_number(arg, name, i + 1))
        .collect()
}

fn bools(args: &[Expression], name: &str) -> Result<Vec<bool>, EvalError> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| expect_bool(arg, name, i + 1))
        .collect()
}

fn arity_error(name: &str, expected: Arity, found: usize) -> EvalError {
    EvalError::BadArgumentCount {
        form: name.to_string(),
        expected,
        found,
    }
}

pub fn prim_not(args: Vec<Expression>) -> EvalResult {
    match args.as_slice() {
        [arg] => Ok(Expression::Bool(!expect_bool(arg, "not", 1)?)),
        other => Err(arity_error("not", Arity::Exactly(1), other.len())),
    }
}

// Every operand is evaluated and type checked; there is no short-circuiting.
fn prim_fold_bools<F: Fn(bool, bool) -> bool>(
    args: Vec<Expression>,
    start: bool,
    func: F,
    operator: &str,
) -> EvalResult {
    Arity::AtLeast(2).check(operator, args.len())?;
    let values = bools(&args, operator)?;
    Ok(Expression::Bool(values.into_iter().fold(start, func)))
}

pub fn prim_and(args: Vec<Expression>) -> EvalResult {
    prim_fold_bools(args, true, |acc, val| acc && val, "and")
}

pub fn prim_or(args: Vec<Expression>) -> EvalResult {
    prim_fold_bools(args, false, |acc, val| acc || val, "or")
}

fn prim_compare<F: Fn(f64, f64) -> bool>(
    args: Vec<Expression>,
    compare: F,
    operator: &str,
) -> EvalResult {
    match numbers(&args, operator)?.as_slice() {
        [left, right] => Ok(Expression::Bool(compare(*left, *right))),
        other => Err(arity_error(operator, Arity::Exactly(2), other.len())),
    }
}

pub fn prim_less_than(args: Vec<Expression>) -> EvalResult {
    prim_compare(args, |left, right| left < right, "<")
}

pub fn prim_less_than_or_equals(args: Vec<Expression>) -> EvalResult {
    prim_compare(args, |left, right| left <= right, "<=")
}

pub fn prim_greater_than(args: Vec<Expression>) -> EvalResult {
    prim_compare(args, |left, right| left > right, ">")
}

pub fn prim_greater_than_or_equals(args: Vec<Expression>) -> EvalResult {
    prim_compare(args, |left, right| left >= right, ">=")
}

pub fn prim_equals(args: Vec<Expression>) -> EvalResult {
    prim_compare(args, |left, right| left == right, "=")
}

fn prim_fold_numbers<F: Fn(f64, f64) -> f64>(
    args: Vec<Expression>,
    start: f64,
    func: F,
    operator: &str,
) -> EvalResult {
    Arity::AtLeast(2).check(operator, args.len())?;
    let values = numbers(&args, operator)?;
    Ok(Expression::Number(values.into_iter().fold(start, func)))
}

pub fn prim_add(args: Vec<Expression>) -> EvalResult {
    prim_fold_numbers(args, 0.0, |acc, val| acc + val, "+")
}

pub fn prim_mul(args: Vec<Expression>) -> EvalResult {
    prim_fold_numbers(args, 1.0, |acc, val| acc * val, "*")
}

pub fn prim_sub(args: Vec<Expression>) -> EvalResult {
    // (- x) -> -x
    // (- x y) -> x - y
    match numbers(&args, "-")?.as_slice() {
        [x] => Ok(Expression::Number(-x)),
        [x, y] => Ok(Expression::Number(x - y)),
        other => Err(arity_error("-", Arity::Between(1, 2), other.len())),
    }
}

pub fn prim_div(args: Vec<Expression>) -> EvalResult {
    // Division by zero follows IEEE semantics: inf or NaN, never an error.
    match numbers(&args, "/")?.as_slice() {
        [x, y] => Ok(Expression::Number(x / y)),
        other => Err(arity_error("/", Arity::Exactly(2), other.len())),
    }
}
