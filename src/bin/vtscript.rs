use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use vtscript::evaluator::reserved_identifiers;
use vtscript::{Interpreter, TokenKind, tokenize};

/// Interpreter for vtscript, a small S-expression language.
///
/// With no arguments an interactive prompt is started.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Evaluate PROGRAM instead of reading a file.
    #[arg(short = 'e', value_name = "PROGRAM", conflicts_with = "file")]
    program: Option<String>,

    /// Script file to run.
    file: Option<PathBuf>,

    /// Where the interactive prompt keeps its history.
    #[arg(long, default_value = "vtscript_history.txt")]
    history: PathBuf,

    /// Use vi key bindings at the interactive prompt.
    #[arg(long)]
    vi: bool,
}

struct VtCompleter {
    interp: Rc<RefCell<Interpreter>>,
}

impl rustyline::completion::Completer for VtCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = match tokenize(&line[..pos]).last() {
            Some(token) if token.kind == TokenKind::Atom && token.span.end == pos => {
                token.text.clone()
            }
            _ => return Ok((pos, vec![])),
        };
        let interp = self.interp.borrow();
        let mut candidates: Vec<String> = interp
            .environment()
            .identifiers()
            .map(str::to_string)
            .chain(reserved_identifiers().map(str::to_string))
            .filter(|id| id.starts_with(&prefix))
            .collect();
        candidates.sort();
        candidates.dedup();
        Ok((pos - prefix.len(), candidates))
    }
}

// Keeps reading lines while a list is still open.
struct VtValidator;

impl Validator for VtValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut depth = 0isize;
        for token in tokenize(ctx.input()) {
            match token.kind {
                TokenKind::OpenParen => depth += 1,
                TokenKind::CloseParen => depth -= 1,
                TokenKind::Atom => {}
            }
            if depth < 0 {
                // Let the parser report the stray paren
                return Ok(ValidationResult::Valid(None));
            }
        }
        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: VtValidator,
    #[rustyline(Completer)]
    completer: VtCompleter,
}

fn report(result: io::Result<()>) {
    if let Err(err) = result {
        warn!(error = %err, "failed to print diagnostic");
    }
}

/// Runs one program in a fresh session; any error is fatal.
fn run_once(name: &str, source: &str) -> ExitCode {
    let mut interp = Interpreter::new();
    if let Err(err) = interp.try_parse(source) {
        report(err.pretty_print(name, source));
        return ExitCode::FAILURE;
    }
    match interp.eval() {
        Ok(result) => {
            println!("({})", result);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(err.pretty_print(name, source));
            ExitCode::FAILURE
        }
    }
}

fn repl(args: &Args) -> rustyline::Result<()> {
    println!("vtscript REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit.");

    let interp = Rc::new(RefCell::new(Interpreter::new()));
    let h = ReplHelper {
        validator: VtValidator,
        completer: VtCompleter {
            interp: interp.clone(),
        },
    };
    let edit_mode = if args.vi {
        rustyline::EditMode::Vi
    } else {
        rustyline::EditMode::Emacs
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(edit_mode)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(&args.history).is_err() {
        println!("No previous history.");
    }

    loop {
        match rl.readline("vtscript> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }

                let mut session = interp.borrow_mut();
                if let Err(err) = session.try_parse(trimmed_input) {
                    eprintln!("Error: Invalid Expression. Could not parse.");
                    report(err.pretty_print("REPL", trimmed_input));
                    continue;
                }
                match session.eval() {
                    Ok(result) => println!("({})", result),
                    Err(err) => {
                        eprintln!("Error: {}", err);
                        // Definitions made before the error are discarded
                        session.reset();
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(&args.history)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VTSCRIPT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Some(program) = &args.program {
        return run_once("-e", program);
    }

    if let Some(path) = &args.file {
        let name = path.display().to_string();
        return match fs::read_to_string(path) {
            Ok(source) => run_once(&name, &source),
            Err(err) => {
                eprintln!("Error: could not read '{}': {}", name, err);
                ExitCode::FAILURE
            }
        };
    }

    match repl(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Readline Error: {:?}", err);
            ExitCode::FAILURE
        }
    }
}
