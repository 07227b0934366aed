//! Log output that keeps a raw-mode terminal readable

use std::io::{self, Write};

/// Writes one log event to a terminal in raw mode.
///
/// Raw mode turns off `\n` to `\r\n` translation, so bare newlines would
/// staircase across the screen. The first write also wipes the prompt line
/// the event lands on.
pub struct RawLineWriter<W: Write> {
    inner: W,
    started: bool,
}

impl<W: Write> RawLineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            started: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl RawLineWriter<io::Stderr> {
    /// `MakeWriter` target: a fresh writer per event
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Write for RawLineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.started {
            self.inner.write_all(b"\r\x1b[2K")?;
            self.started = true;
        }
        for chunk in buf.split_inclusive(|b| *b == b'\n') {
            match chunk.strip_suffix(b"\n") {
                Some(line) => {
                    self.inner.write_all(line)?;
                    self.inner.write_all(b"\r\n")?;
                }
                None => self.inner.write_all(chunk)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
