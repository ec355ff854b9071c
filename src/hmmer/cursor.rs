//! Numbered line cursor with one line of push-back.

use std::io::{self, BufRead};

use super::{HmmerError, HmmerResult};

pub(crate) struct LineCursor<R> {
    rdr: R,
    pending: Option<String>,
    /// Number of the last line handed out (1-based, 0 before the first).
    line: usize,
}

impl<R: BufRead> LineCursor<R> {
    pub fn new(rdr: R) -> Self {
        Self {
            rdr,
            pending: None,
            line: 0,
        }
    }

    /// Next line with its terminator stripped, or `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            self.line += 1;
            return Ok(Some(line));
        }

        let mut buf = String::new();
        if self.rdr.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;

        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(Some(buf))
    }

    /// Next line of a record that is still open; end of input is an error.
    pub fn next_in_record(&mut self, query: &str) -> HmmerResult<String> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(HmmerError::UnexpectedEof {
                query: query.to_string(),
                line: self.line,
            }),
        }
    }

    /// Hands `line` back; the next call to `next_line` returns it again.
    ///
    /// Only the line most recently read may be pushed back.
    pub fn push_back(&mut self, line: String) {
        debug_assert!(self.pending.is_none(), "only one line of push-back");
        self.pending = Some(line);
        self.line = self.line.saturating_sub(1);
    }

    /// Looks at the next line without consuming it.
    pub fn peek(&mut self) -> io::Result<Option<&str>> {
        if self.pending.is_none() {
            if let Some(line) = self.next_line()? {
                self.push_back(line);
            }
        }
        Ok(self.pending.as_deref())
    }

    /// Number of the line most recently returned by `next_line`.
    pub fn line_number(&self) -> usize {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_line_endings() {
        let mut cursor = LineCursor::new("a\r\nb\n\nc".as_bytes());
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("c"));
        assert_eq!(cursor.line_number(), 4);
        assert_eq!(cursor.next_line().unwrap(), None);
        assert_eq!(cursor.line_number(), 4);
    }

    #[test]
    fn test_push_back() {
        let mut cursor = LineCursor::new("one\ntwo\n".as_bytes());
        let first = cursor.next_line().unwrap().unwrap();
        assert_eq!(cursor.line_number(), 1);

        cursor.push_back(first);
        assert_eq!(cursor.line_number(), 0);
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("one"));
        assert_eq!(cursor.line_number(), 1);
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("two"));
        assert_eq!(cursor.line_number(), 2);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut cursor = LineCursor::new("x\ny\n".as_bytes());
        assert_eq!(cursor.peek().unwrap(), Some("x"));
        assert_eq!(cursor.peek().unwrap(), Some("x"));
        assert_eq!(cursor.line_number(), 0);
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("x"));
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("y"));
        assert_eq!(cursor.peek().unwrap(), None);
    }

    #[test]
    fn test_next_in_record_reports_eof() {
        let mut cursor = LineCursor::new("only\n".as_bytes());
        assert_eq!(cursor.next_in_record("q1").unwrap(), "only");
        match cursor.next_in_record("q1") {
            Err(HmmerError::UnexpectedEof { query, line }) => {
                assert_eq!(query, "q1");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
