//! Per-run execution options.

use std::io::Cursor;
use std::time::Duration;

use tokio::io::AsyncRead;

/// Data fed to the process's stdin.
pub enum Input {
    /// An in-memory buffer.
    Bytes(Vec<u8>),
    /// Any async reader, consumed in chunks until end of stream.
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl Input {
    /// Wrap an async reader.
    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    pub(crate) fn into_reader(self) -> Box<dyn AsyncRead + Send + Unpin> {
        match self {
            Self::Bytes(bytes) => Box::new(Cursor::new(bytes)),
            Self::Reader(reader) => reader,
        }
    }
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Optional stdin input and timeout for one `execute` call.
#[derive(Debug, Default)]
pub struct ExecuteOptions {
    pub(crate) input: Option<Input>,
    pub(crate) timeout: Option<Duration>,
}

impl ExecuteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `input` to the process's stdin.
    #[must_use]
    pub fn input(mut self, input: impl Into<Input>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Feed an async reader to the process's stdin.
    #[must_use]
    pub fn input_reader(mut self, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        self.input = Some(Input::reader(reader));
        self
    }

    /// Fail with a timeout if the process has not exited after `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    #[must_use]
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
