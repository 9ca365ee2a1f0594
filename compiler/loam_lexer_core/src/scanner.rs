//! Resumable tokenizer over a [`SourceReader`].
//!
//! The scanner is a two-state machine: `WaitingForIndent` at the start
//! of each line, `WithinLine` once the leading indentation has been
//! measured. It produces tokens into an internal FIFO; [`next_token`]
//! (Tokenizer::next_token) pops the front and batch-fills up to
//! [`TOKENIZER_BATCH_SIZE`] tokens per refill. Batching never changes
//! the observable token order or content.
//!
//! Lexical errors are emitted as [`Token::Error`] values. Unrecoverable
//! conditions (a disallowed byte, mixed indentation, a string or comment
//! failure, a read error) transition the scanner directly to its EOF
//! state; number-literal errors abandon the literal but let lexing
//! continue.

use std::io::Read;

use crate::chars::{
    self, ASCII_CR, ASCII_LF, INLINE_COMMENT, SHELL_COMMENT,
};
use crate::reader::SourceReader;
use crate::token::{IndentKind, Nonnegative, SourceError, Token, TokenFifo, WordKind};

/// Number of tokens produced per FIFO refill.
pub const TOKENIZER_BATCH_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    WaitingForIndent,
    WithinLine,
}

#[derive(Clone, Copy, Debug)]
enum CommentKind {
    Shell,
    Inline,
}

impl CommentKind {
    fn name(self) -> &'static str {
        match self {
            CommentKind::Shell => "shell",
            CommentKind::Inline => "inline",
        }
    }
}

/// Resumable lexical state machine.
///
/// Single-owner: one instance per file, pulled from one call stack.
pub struct Tokenizer<R> {
    reader: SourceReader<R>,
    /// For error tokens only; the scanner never prints.
    filename: String,
    fifo: TokenFifo,
    state: State,
    /// 1-based; 0 until the first line is entered.
    line: u32,
    /// Reader position at the start of the current line; columns are
    /// `reader.pos() - line_start` for an already-consumed byte.
    line_start: u32,
    /// Indent character locked in on first use.
    indent_char: Option<u8>,
    had_eof: bool,
}

impl<R: Read> Tokenizer<R> {
    pub fn new(reader: SourceReader<R>, filename: impl Into<String>) -> Self {
        Tokenizer {
            reader,
            filename: filename.into(),
            fifo: TokenFifo::new(),
            state: State::WaitingForIndent,
            line: 0,
            line_start: 0,
            indent_char: None,
            had_eof: false,
        }
    }

    /// Pull the next token. Keeps returning [`Token::Eof`] once the
    /// stream has ended.
    pub fn next_token(&mut self) -> Token {
        if self.fifo.is_empty() {
            self.load_at_least(TOKENIZER_BATCH_SIZE);
        }
        self.fifo.pop().unwrap_or(Token::Eof)
    }

    /// Run the state machine until the FIFO holds at least `n` tokens or
    /// the end of the stream is reached.
    fn load_at_least(&mut self, n: usize) {
        while self.fifo.len() < n && !self.had_eof {
            self.read_next();
        }
    }

    /// One step of the state machine. Always consumes input, but may
    /// produce no token (comment-only lines are discarded whole).
    fn read_next(&mut self) {
        match self.state {
            State::WaitingForIndent => self.begin_line(),
            State::WithinLine => match self.reader.next_char() {
                Some(c) => self.within_line(c),
                None => self.eof_reached(false),
            },
        }
    }

    // ─── Line starts and indentation ───────────────────────────────────

    /// Process one line's prefix: shell comment, indentation, blank
    /// line, inline comment, or the first real token of the line.
    fn begin_line(&mut self) {
        self.line_start = self.reader.pos();
        self.line += 1;

        // Shell comment marker, only as the very first byte of the line.
        if self.reader.peek_next_char() == Some(SHELL_COMMENT) {
            self.reader.advance();
            self.skip_comment(CommentKind::Shell);
            return;
        }

        let mut level: u32 = 0;
        loop {
            let Some(c) = self.reader.peek_next_char() else {
                // Empty tail of the file; no indent token for it.
                self.eof_reached(false);
                return;
            };
            if !chars::is_inline_wspace(c) {
                break;
            }
            let locked = *self.indent_char.get_or_insert(c);
            if locked == c {
                level += 1;
                self.reader.advance();
            } else {
                let msg = if c == chars::ASCII_TAB {
                    "TAB after SPACE used for indentation"
                } else {
                    "SPACE after TAB used for indentation"
                };
                self.emplace_error(msg, level + 1, 1);
                self.eof_reached(true);
                return;
            }
        }

        // Past the (possibly empty) indentation; the peek above
        // guarantees a byte is available.
        let Some(c) = self.reader.next_char() else {
            self.eof_reached(false);
            return;
        };
        let col = self.reader.pos() - self.line_start;

        if self.try_read_eol(c) {
            // Blank line: an EOL token but no indent token, so blank
            // lines never open or close blocks.
            self.fifo.push(Token::Eol {
                line: self.line,
                col,
            });
            return;
        }

        if c == INLINE_COMMENT[0] && self.reader.peek_next_char() == Some(INLINE_COMMENT[1]) {
            // Comment-only line: no indent token either.
            self.reader.advance();
            self.skip_comment(CommentKind::Inline);
            return;
        }

        if !chars::is_source_char(c) {
            self.emplace_error(format!("Invalid character: 0x{c:02x}"), col, 1);
            self.eof_reached(true);
            return;
        }

        let kind = match self.indent_char {
            Some(chars::ASCII_TAB) => IndentKind::Tab,
            _ => IndentKind::Space,
        };
        self.fifo.push(Token::Indent {
            line: self.line,
            kind,
            level,
        });
        self.state = State::WithinLine;
        self.within_line(c);
    }

    // ─── Within a line ─────────────────────────────────────────────────

    /// Dispatch on an already-consumed byte.
    fn within_line(&mut self, c: u8) {
        let startcol = self.reader.pos() - self.line_start;

        if self.try_read_eol(c) {
            self.fifo.push(Token::Eol {
                line: self.line,
                col: startcol,
            });
            self.state = State::WaitingForIndent;
            return;
        }

        if chars::is_inline_wspace(c) {
            self.read_wspace_run(startcol);
            return;
        }

        if c == INLINE_COMMENT[0] && self.reader.peek_next_char() == Some(INLINE_COMMENT[1]) {
            self.reader.advance();
            self.skip_comment(CommentKind::Inline);
            return;
        }

        if !chars::is_source_char(c) {
            self.emplace_error(format!("Invalid character: 0x{c:02x}"), startcol, 1);
            self.eof_reached(true);
            return;
        }

        if c.is_ascii_alphabetic() {
            self.read_token_identifier(startcol, (c as char).to_string());
        } else if c.is_ascii_digit() {
            self.read_token_number(startcol, c);
        } else if c == b'"' {
            self.read_token_string(startcol);
        } else if chars::is_separator(c) {
            self.fifo.push(Token::Word {
                col: startcol,
                kind: WordKind::Separator,
                text: (c as char).to_string(),
            });
        } else if chars::is_operator(c) {
            let mut text = (c as char).to_string();
            while let Some(c2) = self.reader.peek_next_char() {
                if !chars::is_operator(c2) {
                    break;
                }
                text.push(c2 as char);
                self.reader.advance();
            }
            self.fifo.push(Token::Word {
                col: startcol,
                kind: WordKind::Operator,
                text,
            });
        } else {
            self.fifo.push(Token::Word {
                col: startcol,
                kind: WordKind::Other,
                text: (c as char).to_string(),
            });
        }
    }

    /// Consume a whitespace run. The run is dropped (no token) when it
    /// only pads the end of the line or an inline comment.
    fn read_wspace_run(&mut self, startcol: u32) {
        let t = loop {
            match self.reader.next_char() {
                None => {
                    self.eof_reached(false);
                    return;
                }
                Some(c) if chars::is_inline_wspace(c) => {}
                Some(c) => break c,
            }
        };
        let tcol = self.reader.pos() - self.line_start;
        if self.try_read_eol(t) {
            self.fifo.push(Token::Eol {
                line: self.line,
                col: tcol,
            });
            self.state = State::WaitingForIndent;
            return;
        }
        if t == INLINE_COMMENT[0] && self.reader.peek_next_char() == Some(INLINE_COMMENT[1]) {
            self.reader.advance();
            self.skip_comment(CommentKind::Inline);
            return;
        }
        self.fifo.push(Token::Wspace {
            col: startcol,
            len: tcol - startcol,
        });
        // The terminator is already consumed; lex it directly.
        self.within_line(t);
    }

    // ─── Comments ──────────────────────────────────────────────────────

    /// Consume a comment body through and including its line terminator.
    /// The whole comment is discarded; its bytes are still validated.
    fn skip_comment(&mut self, kind: CommentKind) {
        loop {
            let Some(c) = self.reader.next_char() else {
                self.eof_reached(false);
                return;
            };
            if self.try_read_eol(c) {
                self.state = State::WaitingForIndent;
                return;
            }
            if !chars::is_comment_char(c) {
                let col = self.reader.pos() - self.line_start;
                self.emplace_error(
                    format!("Invalid character in {} comment: 0x{c:02x}", kind.name()),
                    col,
                    1,
                );
                self.eof_reached(true);
                return;
            }
        }
    }

    // ─── Identifiers ───────────────────────────────────────────────────

    /// Extend `collector` with the remaining `[alnum]*` run and emit it.
    fn read_token_identifier(&mut self, startcol: u32, mut collector: String) {
        while let Some(c) = self.reader.peek_next_char() {
            if !c.is_ascii_alphanumeric() {
                break;
            }
            collector.push(c as char);
            self.reader.advance();
        }
        self.fifo.push(Token::Word {
            col: startcol,
            kind: WordKind::Identifier,
            text: collector,
        });
    }

    // ─── Numbers ───────────────────────────────────────────────────────

    /// Called with the first digit already consumed.
    fn read_token_number(&mut self, startcol: u32, first: u8) {
        if first == b'0' {
            if let Some(x @ (b'x' | b'X')) = self.reader.peek_next_char() {
                self.reader.advance();
                self.read_hex_literal(startcol, x);
                return;
            }
        }

        let mut value = read_digit_run(&mut self.reader, Nonnegative::Int(u64::from(first - b'0')));

        if self.reader.peek_next_char() == Some(b'.') {
            self.reader.advance();
            let fractional = self.read_fractional();
            // A zero fraction keeps the exact-integer representation.
            if fractional != 0.0 {
                value = Nonnegative::Float(value.as_f64() + fractional);
            }
        }

        // Characters consumed on suspicion of an exponent; if no digit
        // follows they are re-tokenized as an identifier suffix.
        let mut suffix = String::new();
        if let Some(e_char @ (b'e' | b'E')) = self.reader.peek_next_char() {
            self.reader.advance();
            suffix.push(e_char as char);
            if let Some(sign @ (b'+' | b'-')) = self.reader.peek_next_char() {
                self.reader.advance();
                suffix.push(sign as char);
            }
            let first_exp_digit = self
                .reader
                .peek_next_char()
                .filter(u8::is_ascii_digit);
            if let Some(d) = first_exp_digit {
                self.reader.advance();
                let exp = read_digit_run(
                    &mut self.reader,
                    Nonnegative::Int(u64::from(d - b'0')),
                );
                let Nonnegative::Int(magnitude) = exp else {
                    self.number_error(startcol, "exponent is too high", 0);
                    return;
                };
                if magnitude >= i32::MAX as u64 {
                    self.number_error(startcol, "exponent is too high", 0);
                    return;
                }
                #[allow(clippy::cast_possible_truncation)]
                let mut exponent = magnitude as i32;
                if suffix.ends_with('-') {
                    exponent = -exponent;
                }
                let x = value.as_f64() * 10f64.powi(exponent);
                if x.is_infinite() {
                    self.number_error(startcol, "exponent is too high", 0);
                    return;
                }
                // Re-collapse to the exact representation when possible.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                if x.fract() == 0.0 && x <= u64::MAX as f64 {
                    value = Nonnegative::Int(x as u64);
                } else {
                    value = Nonnegative::Float(x);
                }
                suffix.clear();
            }
        }

        let suffix_len = suffix.len() as u32;
        let len = self.reader.pos() - self.line_start - startcol + 1 - suffix_len;
        match value {
            Nonnegative::Int(_) => {
                self.fifo.push(Token::Number {
                    col: startcol,
                    len,
                    value,
                });
            }
            Nonnegative::Float(x) if x.is_nan() => {
                self.number_error(startcol, "invalid number", suffix_len);
                return;
            }
            Nonnegative::Float(x) if x.is_infinite() => {
                self.number_error(startcol, "number overflow", suffix_len);
                return;
            }
            Nonnegative::Float(_) => {
                self.fifo.push(Token::Number {
                    col: startcol,
                    len,
                    value,
                });
            }
        }

        if !suffix.is_empty() {
            let suffix_col = self.reader.pos() - self.line_start - suffix_len + 1;
            self.read_token_identifier(suffix_col, suffix);
        }
    }

    /// Emit a number-literal error covering the consumed span. The
    /// literal is abandoned but lexing continues.
    fn number_error(&mut self, startcol: u32, msg: &str, excluded_tail: u32) {
        let len = self.reader.pos() - self.line_start - startcol + 1 - excluded_tail;
        self.emplace_error(msg, startcol, len);
    }

    /// Fractional digit run after the decimal point, parsed with the
    /// locale-independent `str` → `f64` conversion. An empty run
    /// contributes zero.
    fn read_fractional(&mut self) -> f64 {
        let mut text = String::from("0.");
        while let Some(c) = self.reader.peek_next_char() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c as char);
            self.reader.advance();
        }
        if text.len() == 2 {
            return 0.0;
        }
        text.parse::<f64>().unwrap_or(0.0)
    }

    /// Called after `0x`/`0X` has been consumed.
    ///
    /// Accumulates up to 16 hex digits; further digits flag the literal
    /// as too long but are still consumed, and a number token is still
    /// produced. `0x` with no digits at all yields a zero token for the
    /// `0` and restarts identifier scanning from the `x`.
    fn read_hex_literal(&mut self, startcol: u32, x_char: u8) {
        let mut value: u64 = 0;
        let mut too_long = false;
        while let Some(c) = self.reader.peek_next_char() {
            let digit = match c {
                b'0'..=b'9' => u64::from(c - b'0'),
                b'a'..=b'f' => u64::from(c - b'a') + 10,
                b'A'..=b'F' => u64::from(c - b'A') + 10,
                _ => break,
            };
            self.reader.advance();
            if value & 0xF000_0000_0000_0000 != 0 {
                too_long = true;
            } else {
                value = (value << 4) | digit;
            }
        }
        let len = self.reader.pos() - self.line_start - startcol + 1;
        if len <= 2 {
            // Bare "0x": a zero for the '0', then the 'x' starts a word.
            self.fifo.push(Token::Number {
                col: startcol,
                len: 1,
                value: Nonnegative::Int(0),
            });
            self.read_token_identifier(startcol + 1, (x_char as char).to_string());
            return;
        }
        if too_long {
            self.emplace_error("hex literal exceeds 8 bytes", startcol, len);
        }
        self.fifo.push(Token::Number {
            col: startcol,
            len,
            value: Nonnegative::Int(value),
        });
    }

    // ─── Strings ───────────────────────────────────────────────────────

    /// Interpreted string literal; the opening quote is consumed.
    fn read_token_string(&mut self, startcol: u32) {
        let mut bytes = Vec::new();
        loop {
            let Some(c) = self.reader.next_char() else {
                let col = self.reader.pos() - self.line_start;
                self.emplace_error("End-of-file in interpreted string literal", col, 1);
                self.eof_reached(false);
                return;
            };
            if c == b'"' {
                break;
            }
            if c < 0x20 {
                let col = self.reader.pos() - self.line_start;
                self.emplace_error(
                    format!("Invalid raw character in interpreted string literal: 0x{c:02x}"),
                    col,
                    1,
                );
                self.eof_reached(true);
                return;
            }
            if c == b'\\' {
                match self.read_escape() {
                    Some(resolved) => bytes.push(resolved),
                    None => return,
                }
            } else {
                bytes.push(c);
            }
        }
        let len = self.reader.pos() - self.line_start - startcol + 1;
        match String::from_utf8(bytes) {
            Ok(value) => self.fifo.push(Token::Str {
                col: startcol,
                len,
                value,
            }),
            Err(_) => {
                self.emplace_error("Invalid UTF-8 in interpreted string literal", startcol, len);
                self.eof_reached(true);
            }
        }
    }

    /// Resolve one escape sequence; the backslash is consumed. Returns
    /// `None` after emitting an error and entering the EOF state.
    fn read_escape(&mut self) -> Option<u8> {
        let Some(c) = self.reader.next_char() else {
            let col = self.reader.pos() - self.line_start;
            self.emplace_error("End-of-file in interpreted string literal", col, 1);
            self.eof_reached(false);
            return None;
        };
        if let Some(resolved) = chars::resolve_escape(c) {
            return Some(resolved);
        }
        let col = self.reader.pos() - self.line_start;
        if c.is_ascii_graphic() || c == b' ' {
            self.emplace_error(
                format!("Invalid escape sequence: \"\\{}\"", c as char),
                col,
                1,
            );
        } else {
            self.emplace_error(
                format!("Invalid escape sequence: raw byte 0x{c:02x} after backslash"),
                col,
                1,
            );
        }
        self.eof_reached(true);
        None
    }

    // ─── Line ends and EOF ─────────────────────────────────────────────

    /// True if `c` terminates the line. A CR is accepted with or
    /// without a following LF; the LF of a CR+LF pair is consumed.
    fn try_read_eol(&mut self, c: u8) -> bool {
        if c == ASCII_CR {
            if self.reader.peek_next_char() == Some(ASCII_LF) {
                self.reader.advance();
            }
            true
        } else {
            c == ASCII_LF
        }
    }

    /// Enter the terminal state. When the input ended for any reason
    /// other than a clean end-of-stream or an already-reported error,
    /// report the read failure first.
    fn eof_reached(&mut self, aborted_due_to_error: bool) {
        if !aborted_due_to_error && !self.reader.is_eof() {
            let col = self.reader.pos() - self.line_start;
            self.emplace_error("can't read file", col, 1);
        }
        self.had_eof = true;
        self.fifo.push(Token::Eof);
    }

    fn emplace_error(&mut self, msg: impl Into<String>, col: u32, len: u32) {
        self.fifo.push(Token::Error(SourceError {
            filename: self.filename.clone(),
            message: msg.into(),
            line: self.line,
            col,
            len,
        }));
    }
}

/// Accumulate a decimal digit run onto an already-started value.
///
/// Stays in exact `u64` arithmetic until a digit would overflow, then
/// switches to floating multiply-accumulate.
#[allow(clippy::cast_precision_loss)]
fn read_digit_run<R: Read>(reader: &mut SourceReader<R>, mut value: Nonnegative) -> Nonnegative {
    while let Some(c) = reader.peek_next_char() {
        if !c.is_ascii_digit() {
            break;
        }
        reader.advance();
        let digit = u64::from(c - b'0');
        value = match value {
            Nonnegative::Int(x) => {
                if x <= (u64::MAX - digit) / 10 {
                    Nonnegative::Int(10 * x + digit)
                } else {
                    Nonnegative::Float(10.0 * x as f64 + digit as f64)
                }
            }
            Nonnegative::Float(x) => Nonnegative::Float(10.0 * x + digit as f64),
        };
    }
    value
}
