//! Terminal emitter: one human-readable line per diagnostic, with
//! optional ANSI color.

use std::io::{self, Write};

use crate::{Diagnostic, Severity};

/// ANSI color codes for terminal output.
mod colors {
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
    pub const WARNING: &str = "\x1b[1;33m"; // Bold yellow
    pub const RESET: &str = "\x1b[0m";
}

/// Color output mode for the terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Decide based on whether the output is a TTY.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolve to a boolean; `is_tty` is only consulted for `Auto`.
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Something diagnostics can be rendered to.
pub trait Emitter {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()>;
}

/// Renders `file:line:col: severity: message` per diagnostic, omitting
/// the location when the diagnostic has none.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
        }
    }

    fn severity_prefix(&self, severity: Severity) -> (&'static str, &'static str) {
        if !self.colors {
            return ("", "");
        }
        match severity {
            Severity::Error => (colors::ERROR, colors::RESET),
            Severity::Warning => (colors::WARNING, colors::RESET),
        }
    }
}

impl TerminalEmitter<io::Stderr> {
    /// Emitter for stderr, the driver default.
    pub fn stderr(mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer: io::stderr(),
            colors: mode.should_use_colors(is_tty),
        }
    }
}

impl<W: Write> Emitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        let (color, reset) = self.severity_prefix(diagnostic.severity);
        if diagnostic.has_location() {
            writeln!(
                self.writer,
                "{}:{}:{}: {color}{}{reset}: {}",
                diagnostic.filename,
                diagnostic.line,
                diagnostic.col,
                diagnostic.severity,
                diagnostic.message,
            )
        } else {
            writeln!(
                self.writer,
                "{}: {color}{}{reset}: {}",
                diagnostic.filename, diagnostic.severity, diagnostic.message,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(diagnostic: &Diagnostic, mode: ColorMode) -> String {
        let mut out = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut out, mode, false);
        emitter
            .emit(diagnostic)
            .unwrap_or_else(|e| panic!("emit failed: {e}"));
        String::from_utf8(out).unwrap_or_else(|e| panic!("non-utf8 output: {e}"))
    }

    #[test]
    fn located_diagnostic_renders_position() {
        let d = Diagnostic {
            severity: Severity::Error,
            filename: "x.loam".into(),
            message: "exponent is too high".into(),
            line: 2,
            col: 5,
            len: 5,
        };
        assert_eq!(
            render(&d, ColorMode::Never),
            "x.loam:2:5: error: exponent is too high\n"
        );
    }

    #[test]
    fn unlocated_diagnostic_omits_position() {
        let d = Diagnostic::error("x.loam", "can't open file");
        assert_eq!(render(&d, ColorMode::Never), "x.loam: error: can't open file\n");
    }

    #[test]
    fn always_mode_adds_ansi_codes() {
        let d = Diagnostic::error("x.loam", "boom");
        let rendered = render(&d, ColorMode::Always);
        assert!(rendered.contains("\x1b[1;31m"));
        assert!(rendered.contains("\x1b[0m"));
    }

    #[test]
    fn auto_mode_respects_tty_flag() {
        assert!(!ColorMode::Auto.should_use_colors(false));
        assert!(ColorMode::Auto.should_use_colors(true));
        assert!(!ColorMode::Never.should_use_colors(true));
        assert!(ColorMode::Always.should_use_colors(false));
    }
}
