//! Classification of `ffmpeg` diagnostic output.
//!
//! Rules are checked in order and the first rule with a matching pattern
//! decides the kind. Phrasing differs between `ffmpeg` releases, so the
//! table is data: extend it with [`ErrorClassifier::with_rule`] instead of
//! editing the matching loop.

use regex::{Regex, RegexBuilder};

use super::{ErrorKind, FfmpegError};

/// Error type for classifier construction.
#[derive(thiserror::Error, Debug)]
pub enum ClassifierError {
    /// Invalid regex pattern.
    #[error("Invalid classifier pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// One row of the classification table.
#[derive(Debug, Clone)]
pub struct ClassifierRule {
    kind: ErrorKind,
    patterns: Vec<Regex>,
}

impl ClassifierRule {
    /// Create a rule from case-insensitive regex patterns.
    ///
    /// # Errors
    ///
    /// Returns `ClassifierError::InvalidPattern` if any pattern is invalid.
    pub fn new<I, S>(kind: ErrorKind, patterns: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| RegexBuilder::new(p.as_ref()).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { kind, patterns })
    }

    /// Check whether any pattern matches somewhere in `message`.
    #[must_use]
    pub fn matches(&self, message: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(message))
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Pattern sources, for debugging.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(Regex::as_str).collect()
    }
}

/// Ordered, immutable classification table.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<ClassifierRule>,
}

impl ErrorClassifier {
    /// Create a classifier from an explicit rule list.
    #[must_use]
    pub fn new(rules: Vec<ClassifierRule>) -> Self {
        Self { rules }
    }

    /// Return a classifier with `rule` appended after the existing rules.
    #[must_use]
    pub fn with_rule(&self, rule: ClassifierRule) -> Self {
        let mut rules = self.rules.clone();
        rules.push(rule);
        Self { rules }
    }

    /// Return a classifier with `rule` checked before the existing rules.
    #[must_use]
    pub fn with_priority_rule(&self, rule: ClassifierRule) -> Self {
        let mut rules = Vec::with_capacity(self.rules.len() + 1);
        rules.push(rule);
        rules.extend(self.rules.iter().cloned());
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    /// Determine the kind for a diagnostic message.
    #[must_use]
    pub fn kind_of(&self, message: &str) -> ErrorKind {
        self.rules
            .iter()
            .find(|rule| rule.matches(message))
            .map_or(ErrorKind::Generic, ClassifierRule::kind)
    }

    /// Build a typed error from a diagnostic message and the argument vector.
    #[must_use]
    pub fn classify(&self, message: &str, arguments: Vec<String>) -> FfmpegError {
        let kind = self.kind_of(message);
        tracing::debug!(%kind, "Classified ffmpeg failure");
        FfmpegError::new(kind, message.trim_end(), arguments)
    }

    fn default_rules() -> Vec<Result<ClassifierRule, ClassifierError>> {
        vec![
            ClassifierRule::new(ErrorKind::FileExists, ["already exists"]),
            ClassifierRule::new(
                ErrorKind::FileNotFound,
                ["no such file", "could not open file"],
            ),
            ClassifierRule::new(
                ErrorKind::UnsupportedCodec,
                [
                    "unknown encoder",
                    "encoder not found",
                    "unknown decoder",
                    "decoder not found",
                ],
            ),
            ClassifierRule::new(
                ErrorKind::InvalidCommand,
                [
                    "option not found",
                    "option .* not found",
                    "unrecognized option",
                    "trailing options were found on the commandline",
                    "invalid encoder type",
                    "codec not currently supported in container",
                ],
            ),
        ]
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        let rules = Self::default_rules()
            .into_iter()
            .filter_map(|result| match result {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to compile default classifier rule");
                    None
                }
            })
            .collect();
        Self { rules }
    }
}
