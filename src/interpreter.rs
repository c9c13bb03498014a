use std::io::Read;

use thiserror::Error;
use tracing::debug;

use crate::environment::Environment;
use crate::evaluator::{EvalError, evaluate};
use crate::lexer::{Token, TokenKind, tokenize, tokenize_reader};
use crate::parser::{ParseError, ParseResult, Parser};
use crate::types::Expression;

/// The single error `Interpreter::eval` reports, whatever went wrong.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SemanticError {
    message: String,
}

impl SemanticError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<EvalError> for SemanticError {
    fn from(err: EvalError) -> Self {
        SemanticError {
            message: err.to_string(),
        }
    }
}

/// An interpreter session: the most recently parsed program and the global
/// environment it is evaluated against.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    program: Option<Expression>,
    env: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            program: None,
            env: Environment::new(),
        }
    }

    /// Parses `source` as the next program to evaluate. Returns false if it
    /// could not be parsed, in which case the previous program is kept.
    pub fn parse(&mut self, source: &str) -> bool {
        self.try_parse(source).is_ok()
    }

    pub fn parse_reader<R: Read>(&mut self, reader: R) -> bool {
        self.try_parse_reader(reader).is_ok()
    }

    /// Like `parse`, but reports why the source was rejected.
    pub fn try_parse(&mut self, source: &str) -> ParseResult<()> {
        let result = self.load(tokenize(source));
        log_failure(&result);
        result
    }

    pub fn try_parse_reader<R: Read>(&mut self, reader: R) -> ParseResult<()> {
        let result = tokenize_reader(reader)
            .map_err(ParseError::from)
            .and_then(|tokens| self.load(tokens));
        log_failure(&result);
        result
    }

    fn load(&mut self, tokens: Vec<Token>) -> ParseResult<()> {
        let bare_atom = first_bare_atom(&tokens).cloned();
        let program = Parser::new(tokens).parse_program()?;
        if let Some(token) = bare_atom {
            return Err(ParseError::BareAtom(token));
        }
        match &program {
            Expression::List(forms) if forms.len() > 1 => {
                self.program = Some(program);
                Ok(())
            }
            _ => Err(ParseError::EmptyProgram),
        }
    }

    /// Evaluates the last successfully parsed program.
    pub fn eval(&mut self) -> Result<Expression, SemanticError> {
        let Some(program) = &self.program else {
            return Err(SemanticError {
                message: "no program has been parsed".to_string(),
            });
        };
        Ok(evaluate(program, &mut self.env)?)
    }

    /// Discards every definition made so far.
    pub fn reset(&mut self) {
        debug!("resetting environment");
        self.env = Environment::new();
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }
}

fn log_failure(result: &ParseResult<()>) {
    if let Err(err) = result {
        debug!(error = %err, "parse failed");
    }
}

// Top-level forms must be parenthesized.
fn first_bare_atom(tokens: &[Token]) -> Option<&Token> {
    let mut depth = 0usize;
    for token in tokens {
        match token.kind {
            TokenKind::OpenParen => depth += 1,
            TokenKind::CloseParen => depth = depth.saturating_sub(1),
            TokenKind::Atom if depth == 0 => return Some(token),
            TokenKind::Atom => {}
        }
    }
    None
}
