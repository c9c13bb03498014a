use logos::{Lexer, Logos, Skip};
use std::fmt;
use std::io::{self, Read};

use crate::Span;

// Raw lexemes recognised by logos. Newlines are matched separately so the
// lexer extras can count lines; everything else that is not whitespace, a
// paren or a comment is part of an atom, so lexing never fails.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip whitespace
#[logos(skip r";[^\n]*")] // Skip comments, the newline is counted below
#[logos(extras = usize)]
enum Lexeme {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("\n", count_newline)]
    Newline,
    #[regex(r"[^ \t\r\n();]+")]
    Atom,
}

fn count_newline(lex: &mut Lexer<Lexeme>) -> Skip {
    lex.extras += 1;
    Skip
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    OpenParen,
    CloseParen,
    Atom,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::OpenParen => write!(f, "open paren"),
            TokenKind::CloseParen => write!(f, "close paren"),
            TokenKind::Atom => write!(f, "atom"),
        }
    }
}

/// A lexical token together with the 1-based line it starts on.
///
/// The span is only carried along for diagnostics and is ignored by `==`.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text && self.line == other.line
    }
}

impl Eq for Token {}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' on line {}", self.kind, self.text, self.line)
    }
}

/// Splits source text into tokens. This never fails: anything that is not a
/// paren, whitespace or a comment becomes an atom and is judged by the parser.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexeme::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let kind = match result {
            Ok(Lexeme::LParen) => TokenKind::OpenParen,
            Ok(Lexeme::RParen) => TokenKind::CloseParen,
            // Newlines are always skipped by their callback, and the atom rule
            // covers every other character, so an error slice is still an atom.
            Ok(Lexeme::Newline) | Ok(Lexeme::Atom) | Err(()) => TokenKind::Atom,
        };
        tokens.push(
            Token::new(kind, lexer.slice(), lexer.extras + 1).with_span(lexer.span().into()),
        );
    }
    tokens
}

/// Reads the whole stream and tokenizes it.
pub fn tokenize_reader<R: Read>(mut reader: R) -> io::Result<Vec<Token>> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    Ok(tokenize(&input))
}
