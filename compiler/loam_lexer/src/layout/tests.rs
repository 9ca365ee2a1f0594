use std::collections::VecDeque;
use std::io::Cursor;

use pretty_assertions::assert_eq;

use loam_lexer_core::{ImplicitKind, SourceReader, Token, WordKind};

use super::{ImplicitTokenInserter, Region, RegionEntry};
use crate::source::{Lexer, TokenSource};

const FILE: &str = "test.loam";

fn drain(src: &str) -> Vec<Token> {
    let reader = SourceReader::new(Cursor::new(src.as_bytes().to_vec()));
    let mut lexer = Lexer::new(reader, FILE);
    let mut out = Vec::new();
    for _ in 0..10_000 {
        let token = lexer.next_token();
        let done = token.is_eof();
        out.push(token);
        if done {
            return out;
        }
    }
    panic!("lexer did not reach EOF");
}

fn ident(col: u32, text: &str) -> Token {
    Token::Word {
        col,
        kind: WordKind::Identifier,
        text: text.into(),
    }
}

fn implicit(line: u32, col: u32, kind: ImplicitKind) -> Token {
    Token::Implicit { line, col, kind }
}

#[test]
fn indented_line_opens_and_closes_a_block() {
    assert_eq!(
        drain("a\n  b\n"),
        vec![
            ident(1, "a"),
            Token::Eol { line: 1, col: 2 },
            implicit(2, 3, ImplicitKind::BeginBlock),
            ident(3, "b"),
            Token::Eol { line: 2, col: 4 },
            implicit(2, 1, ImplicitKind::EndBlock),
            Token::Eof,
        ]
    );
}

#[test]
fn equal_level_lines_are_sequenced() {
    assert_eq!(
        drain("a\nb\n"),
        vec![
            ident(1, "a"),
            Token::Eol { line: 1, col: 2 },
            implicit(2, 1, ImplicitKind::Sequencing),
            ident(1, "b"),
            Token::Eol { line: 2, col: 2 },
            Token::Eof,
        ]
    );
}

#[test]
fn first_line_emits_no_sequencing() {
    let tokens = drain("a\n");
    assert_eq!(
        tokens,
        vec![ident(1, "a"), Token::Eol { line: 1, col: 2 }, Token::Eof]
    );
}

#[test]
fn dedent_closes_nested_blocks() {
    assert_eq!(
        drain("a\n  b\n    c\nd\n"),
        vec![
            ident(1, "a"),
            Token::Eol { line: 1, col: 2 },
            implicit(2, 3, ImplicitKind::BeginBlock),
            ident(3, "b"),
            Token::Eol { line: 2, col: 4 },
            implicit(3, 5, ImplicitKind::BeginBlock),
            ident(5, "c"),
            Token::Eol { line: 3, col: 6 },
            implicit(4, 1, ImplicitKind::EndBlock),
            implicit(4, 1, ImplicitKind::EndBlock),
            ident(1, "d"),
            Token::Eol { line: 4, col: 2 },
            Token::Eof,
        ]
    );
}

#[test]
fn dedent_to_sibling_level_sequences_next_statement() {
    // b and c are siblings inside a's block.
    let tokens = drain("a\n  b\n  c\n");
    assert_eq!(
        tokens,
        vec![
            ident(1, "a"),
            Token::Eol { line: 1, col: 2 },
            implicit(2, 3, ImplicitKind::BeginBlock),
            ident(3, "b"),
            Token::Eol { line: 2, col: 4 },
            implicit(3, 3, ImplicitKind::Sequencing),
            ident(3, "c"),
            Token::Eol { line: 3, col: 4 },
            implicit(3, 1, ImplicitKind::EndBlock),
            Token::Eof,
        ]
    );
}

#[test]
fn eof_closes_all_open_blocks() {
    let tokens = drain("a\n  b");
    assert_eq!(
        tokens,
        vec![
            ident(1, "a"),
            Token::Eol { line: 1, col: 2 },
            implicit(2, 3, ImplicitKind::BeginBlock),
            ident(3, "b"),
            implicit(2, 1, ImplicitKind::EndBlock),
            Token::Eof,
        ]
    );
}

#[test]
fn blank_lines_do_not_close_blocks() {
    let tokens = drain("a\n  b\n\n  c\n");
    let kinds: Vec<_> = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Implicit { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            ImplicitKind::BeginBlock,
            ImplicitKind::Sequencing,
            ImplicitKind::EndBlock,
        ]
    );
}

#[test]
fn lexical_errors_pass_through() {
    let tokens = drain(" \ta\n");
    assert!(matches!(tokens[0], Token::Error(_)));
    assert_eq!(tokens[1], Token::Eof);
}

// === Delimiter regions ===

/// Upstream source fed from a fixed token list.
struct Scripted {
    tokens: VecDeque<Token>,
}

impl TokenSource for Scripted {
    fn next_token(&mut self) -> Token {
        self.tokens.pop_front().unwrap_or(Token::Eof)
    }
}

#[test]
fn unclosed_delimiter_region_surfaces_an_error() {
    use loam_lexer_core::IndentKind;

    let upstream = Scripted {
        tokens: VecDeque::from(vec![
            Token::Indent {
                line: 1,
                kind: IndentKind::Space,
                level: 2,
            },
            ident(3, "a"),
            Token::Eof,
        ]),
    };
    let mut inserter = ImplicitTokenInserter::new(upstream, FILE);

    // Block opens at level 2.
    assert_eq!(
        inserter.next_token(),
        implicit(1, 3, ImplicitKind::BeginBlock)
    );
    assert_eq!(inserter.next_token(), ident(3, "a"));

    // The parser's half of the contract: a paren opened inside the block.
    inserter.open_region(RegionEntry {
        line: 1,
        col: 4,
        level: 2,
        region: Region::Paren,
    });

    // EOF closes the block while the paren is still open.
    let error = inserter.next_token();
    let Token::Error(err) = error else {
        panic!("expected structural error, got {error:?}");
    };
    assert_eq!(
        err.message,
        "block closed with unclosed parenthesis opened at 1:4"
    );
    assert_eq!(inserter.next_token(), implicit(1, 1, ImplicitKind::EndBlock));
    assert_eq!(inserter.next_token(), Token::Eof);
}

#[test]
fn implicit_token_in_input_trips_the_contract_assertion() {
    let upstream = Scripted {
        tokens: VecDeque::from(vec![implicit(1, 1, ImplicitKind::Sequencing)]),
    };
    let mut inserter = ImplicitTokenInserter::new(upstream, FILE);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        inserter.next_token();
    }));
    assert!(result.is_err());
}
