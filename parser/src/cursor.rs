use std::io::{BufRead, Lines};

use crate::ParseError;

/// Reads a source line by line, keeping the current line trimmed.
pub struct LineCursor<R: BufRead> {
    lines: Lines<R>,
    cur: String,
    line_num: usize,
    at_end: bool,
}

impl<R: BufRead> LineCursor<R> {
    /// Wraps `reader` and loads its first line.
    pub fn new(reader: R) -> Result<Self, ParseError> {
        let mut cursor = LineCursor {
            lines: reader.lines(),
            cur: String::new(),
            line_num: 0,
            at_end: false,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    pub fn current(&self) -> &str {
        &self.cur
    }

    pub fn at_end(&self) -> bool {
        self.at_end
    }

    /// 1-based number of the current line.
    pub fn line(&self) -> usize {
        self.line_num
    }

    pub fn advance(&mut self) -> Result<(), ParseError> {
        self.line_num += 1;
        if self.at_end {
            return Ok(());
        }
        match self.lines.next() {
            Some(line) => self.cur = line?.trim().to_string(),
            None => {
                self.at_end = true;
                self.cur.clear();
            }
        }
        Ok(())
    }
}
