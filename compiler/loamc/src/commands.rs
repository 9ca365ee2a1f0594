//! Driver commands: compile a batch of files, or dump one file's tokens.

use std::io::{self, IsTerminal};

use thiserror::Error;
use tracing::debug;

use loam_diagnostic::{ColorMode, Diagnostic, DiagnosticQueue, TerminalEmitter};
use loam_lexer::{Lexer, TokenSource};
use loam_lexer_core::SourceReader;
use loam_parse::{ParseOutcome, Parser};

/// Driver-level failures, reported with the filename and the underlying
/// system error. Lexical and grammar errors never surface here; they
/// travel through the token stream as data.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("can't open file '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl CompileError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::Open { path, source } => {
                Diagnostic::error(path, format!("can't open file: {source}"))
            }
        }
    }
}

/// Compile one file through the full pipeline, pushing every error into
/// the queue. I/O failures short-circuit; everything downstream of a
/// successful open is reported in-band.
pub fn compile_file(
    path: &str,
    queue: &mut DiagnosticQueue,
) -> Result<ParseOutcome, CompileError> {
    debug!(path, "compiling");
    let reader = SourceReader::open(path).map_err(|source| CompileError::Open {
        path: path.to_string(),
        source,
    })?;
    let lexer = Lexer::new(reader, path);
    let outcome = Parser::new(lexer, path).parse_toplevel();
    for err in &outcome.errors {
        queue.push(Diagnostic::from_source_error(err));
    }
    Ok(outcome)
}

/// Compile each file independently — one file's failure never aborts
/// the batch — then report all diagnostics. Returns the total error
/// count for the process exit status.
pub fn run_compiler(files: &[String]) -> usize {
    let mut queue = DiagnosticQueue::new();
    for path in files {
        if let Err(e) = compile_file(path, &mut queue) {
            queue.push(e.to_diagnostic());
        }
    }
    let mut emitter = TerminalEmitter::stderr(ColorMode::Auto, io::stderr().is_terminal());
    if let Err(e) = queue.emit_all(&mut emitter) {
        eprintln!("loam: error: can't write diagnostics: {e}");
    }
    queue.error_count()
}

/// Debug command: print every token of a file, one per line.
pub fn lex_file(path: &str) -> Result<(), CompileError> {
    let reader = SourceReader::open(path).map_err(|source| CompileError::Open {
        path: path.to_string(),
        source,
    })?;
    let mut lexer = Lexer::new(reader, path);
    loop {
        let token = lexer.next_token();
        let done = token.is_eof();
        println!("{token:?}");
        if done {
            return Ok(());
        }
    }
}
