//! Diagnostic reporting for the Loam compiler.
//!
//! The lexical core returns structured error data ([`loam_lexer_core::SourceError`])
//! instead of printing; this crate turns that data into human-readable
//! reports. The split keeps the core silent and testable: only the
//! driver decides where and how diagnostics are rendered.

mod diagnostic;
mod emitter;
mod queue;

pub use diagnostic::{Diagnostic, Severity};
pub use emitter::{ColorMode, Emitter, TerminalEmitter};
pub use queue::DiagnosticQueue;
