//! Command-line assembly.

use std::borrow::Cow;

use super::{expand_all, FfmpegOption, FileSpec, OptionArg, OptionValue};

/// Global options, inputs and outputs in the order they were added.
///
/// Rendering is deterministic: global options first, then every input
/// (its options before its `-i URL` pair), then every output (its options
/// before its URL).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandLine {
    global_options: Vec<FfmpegOption>,
    inputs: Vec<FileSpec>,
    outputs: Vec<FileSpec>,
}

impl CommandLine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a global option, with or without a value.
    pub fn option(&mut self, key: impl Into<String>, value: Option<OptionValue>) {
        self.global_options.push(FfmpegOption::new(key, value));
    }

    /// Add a global option mapping entry; `Many` repeats the flag.
    pub fn option_arg(&mut self, key: impl Into<String>, arg: OptionArg) {
        self.global_options.extend(expand_all([(key, arg)]));
    }

    /// Add an input file with its option mapping.
    pub fn input<I, K, V>(&mut self, url: impl Into<String>, options: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OptionArg>,
    {
        self.inputs.push(FileSpec::input(url, expand_all(options)));
    }

    /// Add an output file with its option mapping.
    pub fn output<I, K, V>(&mut self, url: impl Into<String>, options: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OptionArg>,
    {
        self.outputs.push(FileSpec::output(url, expand_all(options)));
    }

    #[must_use]
    pub fn global_options(&self) -> &[FfmpegOption] {
        &self.global_options
    }

    #[must_use]
    pub fn inputs(&self) -> &[FileSpec] {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &[FileSpec] {
        &self.outputs
    }

    /// Render the argument tokens (without the executable).
    #[must_use]
    pub fn build(&self) -> Vec<String> {
        let mut args = Vec::new();

        for option in &self.global_options {
            option.build_into(&mut args);
        }

        for file in self.inputs.iter().chain(&self.outputs) {
            file.build_into(&mut args);
        }

        args
    }
}

/// An empty option mapping, for files that take no options.
#[must_use]
pub fn no_options() -> Vec<(String, OptionArg)> {
    Vec::new()
}

/// Render an argument vector as a shell-escaped command line.
#[must_use]
pub fn render_command(arguments: &[String]) -> String {
    arguments
        .iter()
        .map(|arg| shell_escape::escape(Cow::Borrowed(arg.as_str())))
        .collect::<Vec<_>>()
        .join(" ")
}
