//! Implicit layout-token synthesis from indentation transitions.
//!
//! The inserter wraps an upstream [`TokenSource`] and rewrites its
//! stream: `Indent` tokens are consumed and replaced by `BeginBlock`,
//! `EndBlock`, and `Sequencing` markers derived from a stack of open
//! regions; everything else passes through unchanged. At end of input
//! all still-open indent blocks are closed before `Eof` is forwarded.

use smallvec::SmallVec;

use loam_lexer_core::{ImplicitKind, SourceError, Token, TokenFifo};

use crate::source::TokenSource;

/// Inline capacity of the region stack; deeper nesting spills to the heap.
const INDENT_STACK_CAPACITY: usize = 10;

/// Kind of structural scope an indentation-stack entry tracks.
///
/// The tokenizer only ever opens `IndentBlock` regions; delimiter
/// regions belong to the parser's half of the contract and reach the
/// stack through [`ImplicitTokenInserter::open_region`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Paren,
    Bracket,
    BraceBlock,
    IndentBlock,
}

impl Region {
    fn describe(self) -> &'static str {
        match self {
            Region::Paren => "parenthesis",
            Region::Bracket => "bracket",
            Region::BraceBlock => "brace",
            Region::IndentBlock => "indent block",
        }
    }
}

/// One open region on the indentation stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionEntry {
    pub line: u32,
    pub col: u32,
    pub level: u32,
    pub region: Region,
}

/// Secondary pass synthesizing layout tokens from indent levels.
///
/// # Invariant
///
/// The stack is never empty: the bottom sentinel has level 0 and region
/// `IndentBlock`, so no line's indentation can pop below it.
pub struct ImplicitTokenInserter<S> {
    source: S,
    /// For structural error tokens only.
    filename: String,
    stack: SmallVec<[RegionEntry; INDENT_STACK_CAPACITY]>,
    fifo: TokenFifo,
    /// Line of the most recent indent token; EOF close-out positions
    /// its end-block markers there.
    line: u32,
    /// The first code line of a file has no preceding statement, so an
    /// equal-level indent there emits no sequencing token.
    saw_statement: bool,
}

impl<S: TokenSource> ImplicitTokenInserter<S> {
    pub fn new(source: S, filename: impl Into<String>) -> Self {
        let mut stack = SmallVec::new();
        stack.push(RegionEntry {
            line: 1,
            col: 1,
            level: 0,
            region: Region::IndentBlock,
        });
        ImplicitTokenInserter {
            source,
            filename: filename.into(),
            stack,
            fifo: TokenFifo::new(),
            line: 0,
            saw_statement: false,
        }
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(token) = self.fifo.pop() {
                return token;
            }
            match self.source.next_token() {
                Token::Indent { line, level, .. } => {
                    self.line = line;
                    self.handle_indent(line, level);
                    // An equal-level first line synthesizes nothing;
                    // loop and pull the next upstream token.
                }
                Token::Implicit { .. } => {
                    panic!("implicit token is not expected in tokenizer output");
                }
                Token::Eof => {
                    self.close_all_regions();
                    self.fifo.push(Token::Eof);
                }
                other => {
                    if let Token::Eol { line, .. } = &other {
                        self.line = *line;
                    }
                    return other;
                }
            }
        }
    }

    /// Open a non-indent region (delimiter tracking for the parser).
    pub fn open_region(&mut self, entry: RegionEntry) {
        self.stack.push(entry);
    }

    /// Compare a line's indent level against the stack and synthesize
    /// the matching layout tokens.
    fn handle_indent(&mut self, line: u32, level: u32) {
        let col = level + 1;
        let top_level = self.top_level();
        if level < top_level {
            while level < self.top_level() {
                self.pop_region(line, col);
            }
        } else if level > top_level {
            self.stack.push(RegionEntry {
                line,
                col,
                level,
                region: Region::IndentBlock,
            });
            self.fifo.push(Token::Implicit {
                line,
                col,
                kind: ImplicitKind::BeginBlock,
            });
        } else if self.saw_statement {
            self.fifo.push(Token::Implicit {
                line,
                col,
                kind: ImplicitKind::Sequencing,
            });
        }
        self.saw_statement = true;
    }

    /// Level of the top region. The sentinel guarantees the stack is
    /// non-empty, so the fallback is unreachable.
    fn top_level(&self) -> u32 {
        self.stack.last().map_or(0, |entry| entry.level)
    }

    /// Pop one region, emitting its closing token. An indent block
    /// closes cleanly; a delimiter region still open when its block
    /// ends is a structural error, surfaced in-band.
    fn pop_region(&mut self, line: u32, col: u32) {
        let Some(entry) = self.stack.pop() else {
            return;
        };
        if entry.region == Region::IndentBlock {
            self.fifo.push(Token::Implicit {
                line,
                col,
                kind: ImplicitKind::EndBlock,
            });
        } else {
            self.fifo.push(Token::Error(SourceError {
                filename: self.filename.clone(),
                message: format!(
                    "block closed with unclosed {} opened at {}:{}",
                    entry.region.describe(),
                    entry.line,
                    entry.col
                ),
                line,
                col,
                len: 1,
            }));
        }
    }

    /// Drain every region above the sentinel at end of input.
    fn close_all_regions(&mut self) {
        let line = self.line.max(1);
        while self.stack.len() > 1 {
            self.pop_region(line, 1);
        }
    }
}

impl<S: TokenSource> TokenSource for ImplicitTokenInserter<S> {
    #[inline]
    fn next_token(&mut self) -> Token {
        ImplicitTokenInserter::next_token(self)
    }
}

#[cfg(test)]
mod tests;
