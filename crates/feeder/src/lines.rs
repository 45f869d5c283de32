//! Bounded line splitting over any `AsyncRead`

use std::io;

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Splits a byte stream into lines
///
/// A line ends at `\n`; one trailing `\r` is dropped. The final
/// unterminated line is returned if the stream holds any bytes after the
/// last `\n`. Lines longer than `max_line_length` fail with
/// `io::ErrorKind::InvalidData`.
pub struct LineReader<R> {
    reader: BufReader<R>,
    max_line_length: usize,
    buf: Vec<u8>,
    line: u64,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Create a new line reader
    pub fn new(reader: R, max_line_length: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            max_line_length,
            buf: Vec::new(),
            line: 0,
        }
    }

    /// Number of lines returned so far
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Read the next line
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    pub async fn next_line(&mut self) -> io::Result<Option<Bytes>> {
        self.buf.clear();

        // content + "\r\n"; anything beyond cannot be a valid line
        let limit = u64::try_from(self.max_line_length)
            .unwrap_or(u64::MAX)
            .saturating_add(2);
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;

        if n == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }

        if self.buf.len() > self.max_line_length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "line {} exceeds maximum length of {} bytes",
                    self.line + 1,
                    self.max_line_length
                ),
            ));
        }

        self.line += 1;
        Ok(Some(Bytes::copy_from_slice(&self.buf)))
    }
}
