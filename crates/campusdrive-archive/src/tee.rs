//! A writer that duplicates its stream into two sinks

use std::io::{self, Write};

/// Forwards every write to both inner writers.
///
/// Used to hash the compressed archive while it is being written to disk,
/// without buffering the whole stream in memory.
pub struct TeeWriter<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Recover both sinks after writing is done.
    pub fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // write_all on both keeps the sinks in lockstep; a short write on
        // one side would desynchronise the digest from the file.
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}
