//! Input and output file specifications.

use super::FfmpegOption;

/// Whether a file is read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Input,
    Output,
}

/// A URL plus the options that apply to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSpec {
    kind: FileKind,
    url: String,
    options: Vec<FfmpegOption>,
}

impl FileSpec {
    /// Create an input file, rendered as `<options> -i <url>`.
    #[must_use]
    pub fn input(url: impl Into<String>, options: Vec<FfmpegOption>) -> Self {
        Self {
            kind: FileKind::Input,
            url: url.into(),
            options,
        }
    }

    /// Create an output file, rendered as `<options> <url>`.
    #[must_use]
    pub fn output(url: impl Into<String>, options: Vec<FfmpegOption>) -> Self {
        Self {
            kind: FileKind::Output,
            url: url.into(),
            options,
        }
    }

    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn options(&self) -> &[FfmpegOption] {
        &self.options
    }

    /// Append this file's tokens to `args`.
    pub fn build_into(&self, args: &mut Vec<String>) {
        for option in &self.options {
            option.build_into(args);
        }

        match self.kind {
            FileKind::Input => {
                args.push("-i".to_string());
                args.push(self.url.clone());
            }
            FileKind::Output => args.push(self.url.clone()),
        }
    }
}
