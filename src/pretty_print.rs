use std::io;
use std::ops::Range;

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};

use crate::{ParseError, SemanticError};

type SourceSpan<'a> = (&'a str, Range<usize>);

// Token spans are byte offsets into the program text.
fn config() -> Config {
    Config::default().with_index_type(IndexType::Byte)
}

impl ParseError {
    /// Builds an annotated report of this error against `input`.
    pub fn report<'a>(&self, name: &'a str, input: &str) -> Report<'a, SourceSpan<'a>> {
        let end = input.len();
        let range = self
            .token()
            .map(|token| token.span.to_range())
            .unwrap_or(end..end);
        let label = match self {
            ParseError::InvalidToken(_) => "This token is not valid here".to_string(),
            ParseError::Unclosed(_) => "This list is never closed".to_string(),
            ParseError::UnmatchedClose(_) => "There is no list to close".to_string(),
            ParseError::EmptyList(_) => "Lists need at least one element".to_string(),
            ParseError::BareAtom(_) => "Wrap this in parentheses".to_string(),
            ParseError::EmptyProgram => "Expected at least one expression".to_string(),
            ParseError::Io(err) => err.to_string(),
        };
        Report::build(ReportKind::Error, (name, range.clone()))
            .with_config(config())
            .with_message(format!("Parse error: {}", self))
            .with_label(Label::new((name, range)).with_message(label))
            .finish()
    }

    /// Prints the report to stderr.
    pub fn pretty_print(&self, name: &str, input: &str) -> io::Result<()> {
        self.report(name, input)
            .eprint((name, Source::from(input)))
    }
}

impl SemanticError {
    /// Builds a report covering the whole program.
    pub fn report<'a>(&self, name: &'a str, input: &str) -> Report<'a, SourceSpan<'a>> {
        let range = trimmed_range(input);
        Report::build(ReportKind::Error, (name, range.clone()))
            .with_config(config())
            .with_message(format!("Semantic error: {}", self))
            .with_label(
                Label::new((name, range)).with_message("Error occurred while evaluating this"),
            )
            .finish()
    }

    pub fn pretty_print(&self, name: &str, input: &str) -> io::Result<()> {
        self.report(name, input)
            .eprint((name, Source::from(input)))
    }
}

// Byte range of `input` without leading and trailing whitespace.
fn trimmed_range(input: &str) -> Range<usize> {
    let start = input.len() - input.trim_start().len();
    let end = input.trim_end().len().max(start);
    start..end
}
