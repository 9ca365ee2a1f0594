//! Buffered source reader with a peek/advance/position cursor.
//!
//! The reader owns a fixed-capacity byte buffer over any [`Read`]
//! implementor (normally a [`File`]) and refills it lazily, exactly when
//! a peek or advance would cross the buffered end. On refill, unread
//! bytes are compacted to the buffer start — never dropped — so callers
//! can treat the stream as continuous. The buffer grows past its
//! configured capacity only when a single line requested through
//! [`read_next_line`](SourceReader::read_next_line) does not fit.
//!
//! A failed read is remembered and distinguished from a clean
//! end-of-stream: after an I/O error, [`peek_next_char`]
//! (SourceReader::peek_next_char) returns `None` but
//! [`is_eof`](SourceReader::is_eof) stays `false`, which lets the
//! tokenizer report "can't read file" instead of silently truncating.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::chars::ASCII_LF;

/// Default read buffer capacity in bytes.
pub const READ_BUF_CAPACITY: usize = 64 * 1024;

/// UTF-8 byte-order mark.
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Scoped owner of a byte source and its read buffer.
///
/// The reader exclusively owns the underlying handle for its lifetime;
/// `Drop` closes it on every exit path.
#[derive(Debug)]
pub struct SourceReader<R> {
    inner: R,
    buf: Vec<u8>,
    /// Index of the next unconsumed byte.
    start: usize,
    /// One past the last valid buffered byte.
    end: usize,
    /// Step by which the buffer grows when a whole line does not fit.
    capacity_step: usize,
    /// Total bytes consumed so far. 1-based column arithmetic: after
    /// consuming the first byte of a line this is `line_start + 1`.
    consumed: u32,
    /// Lines returned by `read_next_line` so far.
    line_num: u32,
    /// The underlying stream reported end-of-stream.
    at_eof: bool,
    /// The underlying stream reported a non-EOF read error.
    read_failed: bool,
}

impl SourceReader<File> {
    /// Open a file in binary mode.
    ///
    /// The caller reports open failures together with the filename; the
    /// reader itself never prints.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(SourceReader::new(File::open(path)?))
    }
}

impl<R: Read> SourceReader<R> {
    /// Wrap a byte source with the default buffer capacity.
    pub fn new(inner: R) -> Self {
        SourceReader::with_capacity(inner, READ_BUF_CAPACITY)
    }

    /// Wrap a byte source with an explicit buffer capacity.
    ///
    /// The capacity must be at least 4 so the BOM check can buffer its
    /// 3-byte prefix without growing.
    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        let capacity = capacity.max(4);
        SourceReader {
            inner,
            buf: vec![0; capacity],
            start: 0,
            end: 0,
            capacity_step: capacity,
            consumed: 0,
            line_num: 0,
            at_eof: false,
            read_failed: false,
        }
    }

    /// The next unconsumed byte, without advancing.
    ///
    /// Refills the buffer if it is exhausted. Returns `None` at true
    /// end-of-stream or after a read error.
    #[inline]
    pub fn peek_next_char(&mut self) -> Option<u8> {
        if self.start == self.end {
            if self.at_eof || self.read_failed {
                return None;
            }
            self.fill_more();
            if self.start == self.end {
                return None;
            }
        }
        Some(self.buf[self.start])
    }

    /// The next unconsumed byte, consuming it.
    #[inline]
    pub fn next_char(&mut self) -> Option<u8> {
        let c = self.peek_next_char()?;
        self.advance();
        Some(c)
    }

    /// Consume one byte after a successful peek.
    #[inline]
    pub fn advance(&mut self) {
        debug_assert!(self.start < self.end, "advance without a buffered byte");
        self.start += 1;
        self.consumed += 1;
    }

    /// Total bytes consumed so far.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.consumed
    }

    /// True once the stream is exhausted and the buffer is drained.
    ///
    /// Stays `false` after a read error, so callers can tell truncation
    /// from a clean end of file.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.at_eof && self.start == self.end
    }

    /// Number of lines returned by [`read_next_line`](Self::read_next_line).
    #[inline]
    pub fn line_num(&self) -> u32 {
        self.line_num
    }

    /// Consume a UTF-8 byte-order mark at the current position, if
    /// present. Returns whether one was consumed.
    ///
    /// Only an exact 3-byte match is consumed; a partial prefix is left
    /// untouched. Called once before tokenization begins.
    pub fn skip_utf8_bom(&mut self) -> bool {
        while self.end - self.start < UTF8_BOM.len() && !self.at_eof && !self.read_failed {
            self.fill_more();
        }
        if self.end - self.start >= UTF8_BOM.len()
            && self.buf[self.start..self.start + UTF8_BOM.len()] == UTF8_BOM
        {
            self.start += UTF8_BOM.len();
            self.consumed += UTF8_BOM.len() as u32;
            true
        } else {
            false
        }
    }

    /// The next line of input, consuming it and its terminating LF.
    ///
    /// The returned slice excludes the LF. The final line of a file
    /// without a trailing LF is returned as-is. Returns `None` once the
    /// stream is exhausted (or unreadable). The buffer grows only when a
    /// single line exceeds its capacity.
    pub fn read_next_line(&mut self) -> Option<&[u8]> {
        let mut scanned = 0;
        loop {
            let unscanned = &self.buf[self.start + scanned..self.end];
            if let Some(i) = memchr::memchr(ASCII_LF, unscanned) {
                let lo = self.start;
                let nl = self.start + scanned + i;
                self.start = nl + 1;
                self.consumed += (self.start - lo) as u32;
                self.line_num += 1;
                return Some(&self.buf[lo..nl]);
            }
            scanned = self.end - self.start;
            if self.at_eof || self.read_failed {
                if self.start == self.end {
                    return None;
                }
                let lo = self.start;
                let hi = self.end;
                self.start = self.end;
                self.consumed += (hi - lo) as u32;
                self.line_num += 1;
                return Some(&self.buf[lo..hi]);
            }
            self.fill_more();
        }
    }

    /// Read more bytes from the underlying stream.
    ///
    /// Compacts unread bytes to the buffer start when the tail is full,
    /// growing the buffer only if it is full end-to-end. Sets `at_eof`
    /// or `read_failed` as appropriate; at most one successful read is
    /// performed per call, so no more than `capacity_step` new bytes
    /// arrive at once.
    fn fill_more(&mut self) {
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
        if self.end == self.buf.len() {
            if self.start > 0 {
                self.buf.copy_within(self.start..self.end, 0);
                self.end -= self.start;
                self.start = 0;
            } else {
                let grown = self.buf.len() + self.capacity_step;
                self.buf.resize(grown, 0);
            }
        }
        loop {
            match self.inner.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.at_eof = true;
                    return;
                }
                Ok(n) => {
                    self.end += n;
                    return;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => {
                    self.read_failed = true;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    fn reader(bytes: &[u8]) -> SourceReader<Cursor<Vec<u8>>> {
        SourceReader::new(Cursor::new(bytes.to_vec()))
    }

    fn small_reader(bytes: &[u8], cap: usize) -> SourceReader<Cursor<Vec<u8>>> {
        SourceReader::with_capacity(Cursor::new(bytes.to_vec()), cap)
    }

    #[test]
    fn peek_does_not_consume() {
        let mut r = reader(b"ab");
        assert_eq!(r.peek_next_char(), Some(b'a'));
        assert_eq!(r.peek_next_char(), Some(b'a'));
        assert_eq!(r.pos(), 0);
        assert_eq!(r.next_char(), Some(b'a'));
        assert_eq!(r.pos(), 1);
        assert_eq!(r.next_char(), Some(b'b'));
        assert_eq!(r.next_char(), None);
        assert!(r.is_eof());
    }

    #[test]
    fn advance_after_peek() {
        let mut r = reader(b"xy");
        assert_eq!(r.peek_next_char(), Some(b'x'));
        r.advance();
        assert_eq!(r.peek_next_char(), Some(b'y'));
        assert_eq!(r.pos(), 1);
    }

    #[test]
    fn refill_across_small_buffer() {
        let mut r = small_reader(b"abcdefghij", 4);
        let mut out = Vec::new();
        while let Some(c) = r.next_char() {
            out.push(c);
        }
        assert_eq!(out, b"abcdefghij");
        assert_eq!(r.pos(), 10);
        assert!(r.is_eof());
    }

    #[test]
    fn empty_source_is_immediately_eof() {
        let mut r = reader(b"");
        assert_eq!(r.peek_next_char(), None);
        assert!(r.is_eof());
    }

    // === read_next_line ===

    #[test]
    fn line_without_terminator_round_trips() {
        // A file with N bytes and no LF yields one line with all N bytes.
        let mut r = reader(b"hello");
        assert_eq!(r.read_next_line(), Some(&b"hello"[..]));
        assert_eq!(r.line_num(), 1);
        assert_eq!(r.read_next_line(), None);
    }

    #[test]
    fn lines_split_on_lf() {
        let mut r = reader(b"a\nbc\n\nd");
        assert_eq!(r.read_next_line(), Some(&b"a"[..]));
        assert_eq!(r.read_next_line(), Some(&b"bc"[..]));
        assert_eq!(r.read_next_line(), Some(&b""[..]));
        assert_eq!(r.read_next_line(), Some(&b"d"[..]));
        assert_eq!(r.read_next_line(), None);
        assert_eq!(r.line_num(), 4);
    }

    #[test]
    fn long_line_grows_buffer() {
        let mut r = small_reader(b"abcdefgh\nxyz", 4);
        assert_eq!(r.read_next_line(), Some(&b"abcdefgh"[..]));
        assert_eq!(r.read_next_line(), Some(&b"xyz"[..]));
        assert_eq!(r.read_next_line(), None);
    }

    #[test]
    fn line_reads_advance_pos() {
        let mut r = reader(b"ab\ncd");
        let _ = r.read_next_line();
        assert_eq!(r.pos(), 3); // "ab" plus the LF
        assert_eq!(r.next_char(), Some(b'c'));
    }

    // === BOM ===

    #[test]
    fn bom_is_consumed_on_exact_match() {
        let mut r = reader(b"\xEF\xBB\xBFa");
        assert!(r.skip_utf8_bom());
        assert_eq!(r.pos(), 3);
        assert_eq!(r.next_char(), Some(b'a'));
    }

    #[test]
    fn partial_bom_is_left_untouched() {
        let mut r = reader(b"\xEF\xBBx");
        assert!(!r.skip_utf8_bom());
        assert_eq!(r.pos(), 0);
        assert_eq!(r.next_char(), Some(0xEF));
    }

    #[test]
    fn no_bom_on_plain_source() {
        let mut r = reader(b"abc");
        assert!(!r.skip_utf8_bom());
        assert_eq!(r.next_char(), Some(b'a'));
    }

    #[test]
    fn bom_on_short_input() {
        let mut r = reader(b"\xEF");
        assert!(!r.skip_utf8_bom());
        assert_eq!(r.next_char(), Some(0xEF));
        assert_eq!(r.next_char(), None);
    }

    // === read errors ===

    /// Reader that fails after yielding a prefix.
    struct FailAfter {
        data: Vec<u8>,
        given: usize,
    }

    impl Read for FailAfter {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            if self.given < self.data.len() {
                let n = (self.data.len() - self.given).min(out.len());
                out[..n].copy_from_slice(&self.data[self.given..self.given + n]);
                self.given += n;
                Ok(n)
            } else {
                Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            }
        }
    }

    #[test]
    fn read_error_is_not_eof() {
        let mut r = SourceReader::with_capacity(
            FailAfter {
                data: b"ab".to_vec(),
                given: 0,
            },
            4,
        );
        assert_eq!(r.next_char(), Some(b'a'));
        assert_eq!(r.next_char(), Some(b'b'));
        assert_eq!(r.next_char(), None);
        assert!(!r.is_eof());
    }
}
