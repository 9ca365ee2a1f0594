//! The pull interface chaining the lexical pipeline together.

use std::io::Read;

use loam_lexer_core::{SourceReader, Token, Tokenizer};

use crate::layout::ImplicitTokenInserter;

/// "Give me the next token."
///
/// Repeated calls after EOF are idempotent and keep returning
/// [`Token::Eof`]. No implementor pulls more than one token ahead of
/// what it has returned, except the tokenizer's internal batch FIFO.
pub trait TokenSource {
    fn next_token(&mut self) -> Token;
}

impl<R: Read> TokenSource for Tokenizer<R> {
    #[inline]
    fn next_token(&mut self) -> Token {
        Tokenizer::next_token(self)
    }
}

/// The composed lexical pipeline: reader → tokenizer → layout inserter.
///
/// Consumes the optional UTF-8 byte-order mark before tokenization
/// begins, so a BOM-prefixed file tokenizes identically to one without.
pub struct Lexer<R: Read> {
    inner: ImplicitTokenInserter<Tokenizer<R>>,
}

impl<R: Read> Lexer<R> {
    pub fn new(mut reader: SourceReader<R>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        reader.skip_utf8_bom();
        let tokenizer = Tokenizer::new(reader, filename.clone());
        Lexer {
            inner: ImplicitTokenInserter::new(tokenizer, filename),
        }
    }
}

impl<R: Read> TokenSource for Lexer<R> {
    #[inline]
    fn next_token(&mut self) -> Token {
        self.inner.next_token()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    fn drain(src: &[u8]) -> Vec<Token> {
        let reader = SourceReader::new(Cursor::new(src.to_vec()));
        let mut lexer = Lexer::new(reader, "test.loam");
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

    #[test]
    fn bom_prefixed_file_tokenizes_identically() {
        let plain = drain(b"a\n  b\n");
        let with_bom = drain(b"\xEF\xBB\xBFa\n  b\n");
        assert_eq!(plain, with_bom);
    }

    #[test]
    fn eof_is_idempotent_through_the_whole_chain() {
        let reader = SourceReader::new(Cursor::new(b"a".to_vec()));
        let mut lexer = Lexer::new(reader, "test.loam");
        while !lexer.next_token().is_eof() {}
        assert_eq!(lexer.next_token(), Token::Eof);
        assert_eq!(lexer.next_token(), Token::Eof);
    }
}
