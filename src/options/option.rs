//! Single command-line options and their values.

use std::fmt;

/// A scalar option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Text value, passed through unchanged.
    Str(String),
    /// Integer value, wide enough for every primitive integer up to `i128`.
    Int(i128),
    /// Floating-point value.
    Float(f64),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for OptionValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for OptionValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

macro_rules! impl_int_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for OptionValue {
                fn from(value: $ty) -> Self {
                    Self::Int(i128::from(value))
                }
            }
        )*
    };
}

impl_int_value!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<i128> for OptionValue {
    fn from(value: i128) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for OptionValue {
    fn from(value: usize) -> Self {
        // Pointer-sized integers are at most 64 bits on supported targets.
        Self::Int(value as i128)
    }
}

impl From<isize> for OptionValue {
    fn from(value: isize) -> Self {
        Self::Int(value as i128)
    }
}

/// The value side of an option mapping entry.
///
/// `Many` expands into one option per value, all sharing the same key.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionArg {
    /// Flag without a value, e.g. `-y`.
    Flag,
    /// Flag followed by a single value.
    One(OptionValue),
    /// The same flag repeated once per value, in order.
    Many(Vec<OptionValue>),
}

macro_rules! impl_scalar_arg {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for OptionArg {
                fn from(value: $ty) -> Self {
                    Self::One(OptionValue::from(value))
                }
            }
        )*
    };
}

impl_scalar_arg!(
    &str, String, &String, f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize
);

impl From<OptionValue> for OptionArg {
    fn from(value: OptionValue) -> Self {
        Self::One(value)
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionArg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Flag, |v| Self::One(v.into()))
    }
}

impl<T: Into<OptionValue>> From<Vec<T>> for OptionArg {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<OptionValue>, const N: usize> From<[T; N]> for OptionArg {
    fn from(values: [T; N]) -> Self {
        Self::Many(values.into_iter().map(Into::into).collect())
    }
}

/// A single `-key [value]` option.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegOption {
    key: String,
    value: Option<OptionValue>,
}

impl FfmpegOption {
    /// Create an option. Leading dashes on the key are dropped.
    #[must_use]
    pub fn new(key: impl Into<String>, value: Option<OptionValue>) -> Self {
        let key: String = key.into();
        Self {
            key: key.trim_start_matches('-').to_string(),
            value,
        }
    }

    /// Create a value-less flag.
    #[must_use]
    pub fn flag(key: impl Into<String>) -> Self {
        Self::new(key, None)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> Option<&OptionValue> {
        self.value.as_ref()
    }

    /// Append this option's tokens to `args`.
    pub fn build_into(&self, args: &mut Vec<String>) {
        args.push(format!("-{}", self.key));
        if let Some(value) = &self.value {
            args.push(value.to_string());
        }
    }

    /// Render this option as one or two argument tokens.
    #[must_use]
    pub fn build(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(2);
        self.build_into(&mut args);
        args
    }
}

/// Expand one mapping entry into options, repeating the key for `Many`.
pub fn expand(key: impl Into<String>, arg: OptionArg) -> Vec<FfmpegOption> {
    let key = key.into();
    match arg {
        OptionArg::Flag => vec![FfmpegOption::new(key, None)],
        OptionArg::One(value) => vec![FfmpegOption::new(key, Some(value))],
        OptionArg::Many(values) => values
            .into_iter()
            .map(|value| FfmpegOption::new(key.clone(), Some(value)))
            .collect(),
    }
}

/// Expand a whole option mapping, preserving entry order.
pub fn expand_all<I, K, V>(options: I) -> Vec<FfmpegOption>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<OptionArg>,
{
    options
        .into_iter()
        .flat_map(|(key, value)| expand(key, value.into()))
        .collect()
}
