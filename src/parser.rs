use crate::lexer::{Token, TokenKind};
use crate::types::Expression;
use std::io;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid token: {0}")]
    InvalidToken(Token),
    #[error("unclosed {0}")]
    Unclosed(Token),
    #[error("unexpected {0}")]
    UnmatchedClose(Token),
    #[error("empty list starting at {0}")]
    EmptyList(Token),
    #[error("program contains no expressions")]
    EmptyProgram,
    #[error("bare {0} outside of a list")]
    BareAtom(Token),
    #[error("failed to read program: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// The token the error points at, if there is one.
    pub fn token(&self) -> Option<&Token> {
        match self {
            ParseError::InvalidToken(token)
            | ParseError::Unclosed(token)
            | ParseError::UnmatchedClose(token)
            | ParseError::EmptyList(token)
            | ParseError::BareAtom(token) => Some(token),
            ParseError::EmptyProgram | ParseError::Io(_) => None,
        }
    }
}

// Result type alias for convenience
pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    // We iterate over owned Tokens, consuming them.
    tokens: IntoIter<Token>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter(),
        }
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    /// Parses every top-level form and wraps them in `(begin ...)`.
    pub fn parse_program(mut self) -> ParseResult<Expression> {
        let mut forms = vec![Expression::symbol("begin")];
        while let Some(token) = self.next_token() {
            let form = match token.kind {
                TokenKind::OpenParen => {
                    check_paren(&token, "(")?;
                    self.parse_list(token)?
                }
                TokenKind::CloseParen => {
                    check_paren(&token, ")")?;
                    return Err(ParseError::UnmatchedClose(token));
                }
                TokenKind::Atom => parse_atom(&token)?,
            };
            forms.push(form);
        }
        Ok(Expression::List(forms))
    }

    /// Parses the rest of a list whose `(` has already been consumed.
    fn parse_list(&mut self, open: Token) -> ParseResult<Expression> {
        let mut children = Vec::new();
        loop {
            let Some(token) = self.next_token() else {
                // Reached EOF before finding ')'
                return Err(ParseError::Unclosed(open));
            };
            match token.kind {
                TokenKind::OpenParen => {
                    check_paren(&token, "(")?;
                    children.push(self.parse_list(token)?);
                }
                TokenKind::CloseParen => {
                    check_paren(&token, ")")?;
                    if children.is_empty() {
                        return Err(ParseError::EmptyList(open));
                    }
                    return Ok(Expression::List(children));
                }
                TokenKind::Atom => children.push(parse_atom(&token)?),
            }
        }
    }
}

// A paren token must carry exactly its paren text.
fn check_paren(token: &Token, text: &str) -> ParseResult<()> {
    if token.text == text {
        Ok(())
    } else {
        Err(ParseError::InvalidToken(token.clone()))
    }
}

/// Classifies an atom token as a boolean, `None`, a number or a symbol.
fn parse_atom(token: &Token) -> ParseResult<Expression> {
    let text = token.text.as_str();
    match text {
        "" | "(" | ")" => Err(ParseError::InvalidToken(token.clone())),
        "True" => Ok(Expression::Bool(true)),
        "False" => Ok(Expression::Bool(false)),
        "None" => Ok(Expression::None),
        _ if is_number(text) => text
            .parse::<f64>()
            .map(Expression::Number)
            .map_err(|_| ParseError::InvalidToken(token.clone())),
        _ if text.starts_with(|c: char| c.is_ascii_digit()) => {
            Err(ParseError::InvalidToken(token.clone()))
        }
        _ => Ok(Expression::symbol(text)),
    }
}

/// Numeric literals: an optional sign, digits with at most one `.`, and an
/// optional `e` exponent made of digits only. The mantissa needs a digit and
/// the token may not start with `.` or `e`; `-.5` is a number, `.5` is not.
pub fn is_number(text: &str) -> bool {
    if text.starts_with(['.', 'e']) {
        return false;
    }
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut mantissa_digits = false;
    let mut exponent_digits = false;
    let mut hit_dot = false;
    let mut hit_e = false;
    for c in body.chars() {
        match c {
            '0'..='9' if hit_e => exponent_digits = true,
            '0'..='9' => mantissa_digits = true,
            '.' if !hit_dot && !hit_e => hit_dot = true,
            'e' if !hit_e => hit_e = true,
            _ => return false,
        }
    }
    mantissa_digits && (!hit_e || exponent_digits)
}

// Helper function to lex and parse a string directly (useful for tests)
pub fn parse_str(input: &str) -> ParseResult<Expression> {
    Parser::new(crate::lexer::tokenize(input)).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Expression {
        Expression::symbol(name)
    }

    fn num(n: f64) -> Expression {
        Expression::Number(n)
    }

    fn list(children: Vec<Expression>) -> Expression {
        Expression::List(children)
    }

    fn program(forms: Vec<Expression>) -> Expression {
        let mut children = vec![sym("begin")];
        children.extend(forms);
        list(children)
    }

    // Helper for asserting successful parsing
    fn assert_parse(input: &str, expected: Expression) {
        match parse_str(input) {
            Ok(result) => assert_eq!(result, expected, "Input: '{}'", input),
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        }
    }

    // Helper for asserting parse errors
    fn assert_parse_error(input: &str, expected_error_variant: ParseError) {
        match parse_str(input) {
            Ok(result) => panic!(
                "Expected parsing to fail for input '{}', but got: {:?}",
                input, result
            ),
            Err(e) => {
                // Compare enum variants, ignoring specific content for simplicity
                assert_eq!(
                    std::mem::discriminant(&e),
                    std::mem::discriminant(&expected_error_variant),
                    "Input: '{}', Expected error variant like {:?}, got: {:?}",
                    input,
                    expected_error_variant,
                    e
                );
            }
        }
    }

    fn dummy_token() -> Token {
        Token::new(TokenKind::Atom, "", 0)
    }

    fn atom_token(text: &str) -> Token {
        Token::new(TokenKind::Atom, text, 1)
    }

    #[test]
    fn test_match_bool() {
        assert_eq!(parse_atom(&atom_token("True")).unwrap(), Expression::Bool(true));
        assert_eq!(parse_atom(&atom_token("False")).unwrap(), Expression::Bool(false));
        for text in ["true", "false", "TRUE", "FALSE", "notabool"] {
            assert_eq!(parse_atom(&atom_token(text)).unwrap(), sym(text));
        }
    }

    #[test]
    fn test_match_none() {
        assert_eq!(parse_atom(&atom_token("None")).unwrap(), Expression::None);
        assert_eq!(parse_atom(&atom_token("none")).unwrap(), sym("none"));
        assert_eq!(parse_atom(&atom_token("NONE")).unwrap(), sym("NONE"));
    }

    #[test]
    fn test_match_number() {
        for text in [
            "3", "314", "3.14", "314.", "-4", "+10", "1e5", "2.5e10", "-0.9", "-.5", "+.5", "-.5e2",
        ] {
            assert!(is_number(text), "'{}' should be a number", text);
        }
        for text in [
            "+", "-", "abc", ".3", "e5", "1e", "1.2.3", "1e2.5", "--5", "1-2", "-.", "-e5", "1e-5",
            "1E5", "",
        ] {
            assert!(!is_number(text), "'{}' should not be a number", text);
        }
    }

    #[test]
    fn test_parse_atoms() {
        assert_parse("(3.14)", program(vec![list(vec![num(3.14)])]));
        assert_parse("(-4)", program(vec![list(vec![num(-4.0)])]));
        assert_parse("(314.)", program(vec![list(vec![num(314.0)])]));
        assert_parse("(-.5)", program(vec![list(vec![num(-0.5)])]));
        assert_parse("(+.5e2)", program(vec![list(vec![num(50.0)])]));
        assert_parse("(.5)", program(vec![list(vec![sym(".5")])]));
        assert_parse("(pi)", program(vec![list(vec![sym("pi")])]));
        assert_parse("(+)", program(vec![list(vec![sym("+")])]));
        assert_parse("(None)", program(vec![list(vec![Expression::None])]));
    }

    #[test]
    fn test_parse_wraps_in_begin() {
        assert_parse(
            "(define a 1) (+ a 2)",
            program(vec![
                list(vec![sym("define"), sym("a"), num(1.0)]),
                list(vec![sym("+"), sym("a"), num(2.0)]),
            ]),
        );
        assert_parse("", program(vec![]));
        assert_parse("; nothing here\n", program(vec![]));
    }

    #[test]
    fn test_parse_bare_atoms_at_top_level() {
        // The grammar itself accepts them; the interpreter session rejects them.
        assert_parse("hello", program(vec![sym("hello")]));
        assert_parse("True 1", program(vec![Expression::Bool(true), num(1.0)]));
    }

    #[test]
    fn test_parse_nested_list() {
        assert_parse(
            "(begin (define r 10) (* pi (* r r)))",
            program(vec![list(vec![
                sym("begin"),
                list(vec![sym("define"), sym("r"), num(10.0)]),
                list(vec![
                    sym("*"),
                    sym("pi"),
                    list(vec![sym("*"), sym("r"), sym("r")]),
                ]),
            ])]),
        );
    }

    #[test]
    fn test_parse_from_tokens() {
        let tokens = vec![
            Token::new(TokenKind::OpenParen, "(", 1),
            Token::new(TokenKind::Atom, "abc", 1),
            Token::new(TokenKind::CloseParen, ")", 1),
        ];
        let parsed = Parser::new(tokens).parse_program().unwrap();
        assert_eq!(parsed, program(vec![list(vec![sym("abc")])]));
    }

    #[test]
    fn test_parse_errors_unclosed() {
        let unclosed = ParseError::Unclosed(dummy_token());
        assert_parse_error("(f", unclosed);
        assert_parse_error(
            "(begin (define r 10) (* pi (* r r",
            ParseError::Unclosed(dummy_token()),
        );
        assert_parse_error("(", ParseError::Unclosed(dummy_token()));
    }

    #[test]
    fn test_unclosed_points_at_opening_paren() {
        match parse_str("(a\n  (b c)\n  (d") {
            Err(ParseError::Unclosed(token)) => {
                assert_eq!(token, Token::new(TokenKind::OpenParen, "(", 3))
            }
            other => panic!("expected an unclosed list error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors_unmatched_close() {
        assert_parse_error(
            "(begin (define r 10) (* pi (* r r))) )",
            ParseError::UnmatchedClose(dummy_token()),
        );
        assert_parse_error(")", ParseError::UnmatchedClose(dummy_token()));
    }

    #[test]
    fn test_parse_errors_empty_list() {
        assert_parse_error("( )", ParseError::EmptyList(dummy_token()));
        assert_parse_error("(+ 1 ())", ParseError::EmptyList(dummy_token()));
    }

    #[test]
    fn test_parse_errors_invalid_atom() {
        assert_parse_error("(1abc)", ParseError::InvalidToken(dummy_token()));
        assert_parse_error("(+ 2x 1)", ParseError::InvalidToken(dummy_token()));
    }

    #[test]
    fn test_structurally_inconsistent_tokens() {
        let cases = vec![
            vec![Token::new(TokenKind::OpenParen, ")", 1)],
            vec![
                Token::new(TokenKind::OpenParen, "(", 1),
                Token::new(TokenKind::Atom, "x", 1),
                Token::new(TokenKind::CloseParen, "(", 1),
            ],
            vec![Token::new(TokenKind::Atom, "(", 1)],
        ];
        for tokens in cases {
            let result = Parser::new(tokens.clone()).parse_program();
            assert!(
                matches!(result, Err(ParseError::InvalidToken(_))),
                "Tokens {:?} gave {:?}",
                tokens,
                result
            );
        }
    }
}
