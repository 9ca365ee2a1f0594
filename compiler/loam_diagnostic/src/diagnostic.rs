use std::fmt;

use loam_lexer_core::SourceError;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A renderable diagnostic: severity, origin, message, and an optional
/// 1-based source location.
#[derive(Clone, Eq, PartialEq, Debug)]
#[must_use = "diagnostics should be reported or queued, not silently dropped"]
pub struct Diagnostic {
    pub severity: Severity,
    pub filename: String,
    pub message: String,
    pub line: u32,
    pub col: u32,
    pub len: u32,
}

impl Diagnostic {
    /// Create an error diagnostic without a source location.
    pub fn error(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            filename: filename.into(),
            message: message.into(),
            line: 0,
            col: 0,
            len: 0,
        }
    }

    /// Promote an in-band lexical error to a diagnostic.
    pub fn from_source_error(err: &SourceError) -> Self {
        Diagnostic {
            severity: Severity::Error,
            filename: err.filename.clone(),
            message: err.message.clone(),
            line: err.line,
            col: err.col,
            len: err.len,
        }
    }

    /// Whether the diagnostic points at a source position.
    pub fn has_location(&self) -> bool {
        self.line > 0 && self.col > 0
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn from_source_error_keeps_location() {
        let err = SourceError {
            filename: "x.loam".into(),
            message: "bad".into(),
            line: 3,
            col: 7,
            len: 2,
        };
        let d = Diagnostic::from_source_error(&err);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!((d.line, d.col, d.len), (3, 7, 2));
        assert!(d.has_location());
    }

    #[test]
    fn driver_errors_have_no_location() {
        let d = Diagnostic::error("x.loam", "can't open file");
        assert!(!d.has_location());
    }
}
