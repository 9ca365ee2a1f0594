//! Low-level lexical layer for the Loam compiler.
//!
//! This crate is standalone: it has no dependencies on other `loam_*`
//! crates, so external tools (highlighters, formatters) can tokenize
//! source without pulling in the rest of the compiler.
//!
//! The pipeline stage implemented here is bytes → raw tokens:
//!
//! - [`SourceReader`] owns a fixed-capacity read buffer over a file (or
//!   any byte source) and exposes a peek/advance/position cursor.
//! - [`Tokenizer`] is a resumable state machine over the reader that
//!   produces [`Token`] values through an internal FIFO.
//!
//! Lexical errors are data, not panics: the [`Token`] union carries an
//! [`SourceError`] variant, so consumers dispatch on the tag like any
//! other token kind. Layout tokens (block begin/end, sequencing) are
//! synthesized one layer up, in `loam_lexer`.

pub mod chars;
mod reader;
mod scanner;
mod token;

pub use reader::{SourceReader, READ_BUF_CAPACITY};
pub use scanner::{Tokenizer, TOKENIZER_BATCH_SIZE};
pub use token::{
    ImplicitKind, IndentKind, Nonnegative, SourceError, Token, TokenFifo, WordKind,
};
