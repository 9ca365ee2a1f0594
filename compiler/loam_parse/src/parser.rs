//! Top-level parse loop.

use tracing::{debug, trace};

use loam_lexer::TokenSource;
use loam_lexer_core::{SourceError, Token, WordKind};

use crate::ast::{Atom, ExprStmt, FnDef, Item};

/// Result of parsing one file: the items built plus every error that
/// flowed through the token stream or arose in the grammar.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ParseOutcome {
    pub items: Vec<Item>,
    pub errors: Vec<SourceError>,
}

impl ParseOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Pull-based parser over any [`TokenSource`].
///
/// Dispatch is positional: an operator `+` at statement position starts
/// a definition; everything else value-like starts an expression.
pub struct Parser<S> {
    source: S,
    filename: String,
    /// Best-effort current line for grammar errors; maintained from the
    /// line-bearing tokens that pass by.
    line: u32,
    items: Vec<Item>,
    errors: Vec<SourceError>,
}

impl<S: TokenSource> Parser<S> {
    pub fn new(source: S, filename: impl Into<String>) -> Self {
        Parser {
            source,
            filename: filename.into(),
            line: 1,
            items: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Consume the whole token stream and return what was built.
    ///
    /// Every token tag is handled; an unhandled tag here would be a
    /// contract violation with the lexer, not a recoverable parse error.
    pub fn parse_toplevel(mut self) -> ParseOutcome {
        loop {
            let token = self.source.next_token();
            match token {
                Token::Word {
                    kind: WordKind::Operator,
                    text,
                    col,
                } if text == "+" => {
                    self.parse_definition_after_plus(col);
                }
                Token::Word { kind, text, .. } => {
                    self.parse_expression_starting_with(Atom::Word { kind, text });
                }
                Token::Number { value, .. } => {
                    self.parse_expression_starting_with(Atom::Number(value));
                }
                Token::Str { value, .. } => {
                    self.parse_expression_starting_with(Atom::Str(value));
                }
                Token::Eol { line, .. } => self.line = line + 1,
                Token::Indent { line, .. } => self.line = line,
                Token::Wspace { .. } | Token::Implicit { .. } => {}
                Token::Error(err) => self.errors.push(err),
                Token::Eof => break,
            }
        }
        ParseOutcome {
            items: self.items,
            errors: self.errors,
        }
    }

    /// `+` introduces definitions; only `fn` definitions exist so far.
    fn parse_definition_after_plus(&mut self, plus_col: u32) {
        trace!(line = self.line, "definition after '+'");
        match self.next_code_token() {
            Token::Word {
                kind: WordKind::Identifier,
                text,
                ..
            } if text == "fn" => self.parse_fn_def(),
            Token::Error(err) => self.errors.push(err),
            _ => self.record_error("expected 'fn' after '+'", plus_col),
        }
    }

    /// `fn name(param, ...)` — the body grammar is not here yet; the
    /// block tokens that follow flow through the top-level loop.
    fn parse_fn_def(&mut self) {
        let name = match self.next_code_token() {
            Token::Word {
                kind: WordKind::Identifier,
                text,
                ..
            } => text,
            _ => {
                self.record_error("expected function name after 'fn'", 0);
                return;
            }
        };
        match self.next_code_token() {
            Token::Word {
                kind: WordKind::Separator,
                text,
                ..
            } if text == "(" => {}
            _ => {
                self.record_error(format!("expected '(' after function name '{name}'"), 0);
                return;
            }
        }
        let mut params = Vec::new();
        loop {
            match self.next_code_token() {
                Token::Word {
                    kind: WordKind::Identifier,
                    text,
                    ..
                } => params.push(text),
                Token::Word {
                    kind: WordKind::Separator,
                    text,
                    ..
                } if text == ")" => break,
                Token::Word {
                    kind: WordKind::Separator,
                    text,
                    ..
                } if text == "," => {}
                Token::Error(err) => {
                    self.errors.push(err);
                    return;
                }
                Token::Eof => {
                    self.record_error("unexpected end of file in parameter list", 0);
                    return;
                }
                _ => {
                    self.record_error(
                        format!("unexpected token in parameter list of '{name}'"),
                        0,
                    );
                    return;
                }
            }
        }
        debug!(name = %name, params = params.len(), "parsed function definition");
        self.items.push(Item::FnDef(FnDef { name, params }));
    }

    /// Placeholder expression parsing: collect atoms until the end of
    /// the statement.
    fn parse_expression_starting_with(&mut self, first: Atom) {
        trace!(line = self.line, "expression statement");
        let mut atoms = vec![first];
        loop {
            match self.source.next_token() {
                Token::Word { kind, text, .. } => atoms.push(Atom::Word { kind, text }),
                Token::Number { value, .. } => atoms.push(Atom::Number(value)),
                Token::Str { value, .. } => atoms.push(Atom::Str(value)),
                Token::Wspace { .. } => {}
                Token::Indent { line, .. } => self.line = line,
                Token::Eol { line, .. } => {
                    self.line = line + 1;
                    break;
                }
                Token::Implicit { .. } | Token::Eof => break,
                Token::Error(err) => {
                    self.errors.push(err);
                    break;
                }
            }
        }
        self.items.push(Item::Expr(ExprStmt { atoms }));
    }

    /// Next token that is not inline whitespace.
    fn next_code_token(&mut self) -> Token {
        loop {
            match self.source.next_token() {
                Token::Wspace { .. } => {}
                token => return token,
            }
        }
    }

    fn record_error(&mut self, message: impl Into<String>, col: u32) {
        self.errors.push(SourceError {
            filename: self.filename.clone(),
            message: message.into(),
            line: self.line,
            col,
            len: u32::from(col > 0),
        });
    }
}
