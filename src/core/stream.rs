//! Redirectable output sinks shared between a controller and its engine

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A cloneable handle to a writer. Clones write to the same sink.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
    label: &'static str,
}

impl Stream {
    pub fn stdout() -> Self {
        Self::labelled(Box::new(io::stdout()), "stdout")
    }

    pub fn stderr() -> Self {
        Self::labelled(Box::new(io::stderr()), "stderr")
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::labelled(Box::new(writer), "custom")
    }

    /// In-memory stream plus a reader for what was written to it
    pub fn buffer() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        let stream = Self::labelled(Box::new(captured.clone()), "buffer");
        (stream, captured)
    }

    fn labelled(writer: Box<dyn Write + Send>, label: &'static str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
            label,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Write one line. A poisoned lock is recovered rather than dropped.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(guard, "{line}")?;
        guard.flush()
    }

    pub fn write_str(&self, text: &str) -> io::Result<()> {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.write_all(text.as_bytes())?;
        guard.flush()
    }

    pub fn same_sink(&self, other: &Stream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").field("label", &self.label).finish()
    }
}

/// Bytes collected by a [`Stream::buffer`]
#[derive(Clone, Default)]
pub struct CapturedOutput {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn contents(&self) -> String {
        let guard = match self.bytes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        String::from_utf8_lossy(&guard).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.contents().is_empty()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = match self.bytes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
