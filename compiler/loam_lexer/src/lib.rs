//! Lexer integration layer for the Loam compiler.
//!
//! `loam_lexer_core` turns bytes into raw tokens; this crate completes
//! the lexical pipeline by synthesizing layout tokens from indentation
//! and exposing the whole chain behind a single pull interface:
//!
//! ```text
//! SourceReader → Tokenizer → ImplicitTokenInserter → consumer
//! ```
//!
//! Each stage owns its upstream by value, so the chain monomorphizes
//! with no dynamic dispatch. The consumer only sees [`TokenSource`].

mod layout;
mod source;

pub use layout::{ImplicitTokenInserter, Region, RegionEntry};
pub use source::{Lexer, TokenSource};
