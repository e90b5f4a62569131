//! Line splitting for diagnostic output.
//!
//! `ffmpeg` terminates progress lines with `\r` and everything else with
//! `\n`, so any run of either byte counts as one line boundary.

/// Incremental splitter that keeps a trailing partial line between chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    carry: Vec<u8>,
}

impl LineSplitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.carry.extend_from_slice(chunk);

        let Some(last_break) = self.carry.iter().rposition(|b| is_break(*b)) else {
            return Vec::new();
        };

        let rest = self.carry.split_off(last_break + 1);
        let complete = std::mem::replace(&mut self.carry, rest);

        complete
            .split(|b| is_break(*b))
            .filter(|line| !line.is_empty())
            .map(<[u8]>::to_vec)
            .collect()
    }

    /// Flush the trailing partial line at end of stream.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.carry.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.carry))
        }
    }

    /// Bytes currently held back as a partial line.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.carry
    }
}

fn is_break(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}
