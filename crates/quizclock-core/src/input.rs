//! Line-oriented answer sources.
//!
//! A source is read from a dedicated input-collection thread, one answer per
//! problem, so implementations are free to block.

use std::io::{self, BufRead, BufReader, Stdin};

/// Something the runner can pull typed answers from.
pub trait AnswerSource: Send + 'static {
    /// Block until the next answer is available.
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    fn read_answer(&mut self) -> io::Result<Option<String>>;
}

impl AnswerSource for Box<dyn AnswerSource> {
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        (**self).read_answer()
    }
}

/// Reads one line per answer from any buffered reader.
///
/// Only the line terminator is removed; everything else is handed over raw.
pub struct LineSource<R> {
    reader: R,
    buf: String,
}

impl<R: BufRead + Send + 'static> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
        }
    }
}

impl LineSource<BufReader<Stdin>> {
    /// A source over the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: BufRead + Send + 'static> AnswerSource for LineSource<R> {
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(&self.buf).to_string()))
    }
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
