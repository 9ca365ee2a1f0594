//! Diagnostic queue: collects diagnostics across files and keeps the
//! error count the driver turns into an exit status.

use std::io;

use crate::{Diagnostic, Emitter, Severity};

/// Accumulates diagnostics until the driver drains them to an emitter.
///
/// One queue spans a whole compilation; files report into it
/// independently, so one file's failure never hides another's.
#[derive(Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        DiagnosticQueue::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Errors seen so far, across all files.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Drain every queued diagnostic to the emitter, in arrival order.
    /// The error count survives the drain.
    pub fn emit_all(&mut self, emitter: &mut impl Emitter) -> io::Result<()> {
        for diagnostic in self.diagnostics.drain(..) {
            emitter.emit(&diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{ColorMode, TerminalEmitter};

    use super::*;

    #[test]
    fn counts_errors_not_warnings() {
        let mut queue = DiagnosticQueue::new();
        queue.push(Diagnostic::error("a.loam", "one"));
        let mut warning = Diagnostic::error("a.loam", "two");
        warning.severity = Severity::Warning;
        queue.push(warning);
        assert_eq!(queue.error_count(), 1);
        assert!(queue.has_errors());
    }

    #[test]
    fn emit_all_drains_but_keeps_count() {
        let mut queue = DiagnosticQueue::new();
        queue.push(Diagnostic::error("a.loam", "boom"));
        let mut out = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut out, ColorMode::Never, false);
        queue
            .emit_all(&mut emitter)
            .unwrap_or_else(|e| panic!("emit failed: {e}"));
        assert!(queue.is_empty());
        assert_eq!(queue.error_count(), 1);
        assert_eq!(
            String::from_utf8(out).unwrap_or_else(|e| panic!("non-utf8: {e}")),
            "a.loam: error: boom\n"
        );
    }
}
