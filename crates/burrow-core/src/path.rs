use crate::error::AllocationError;
use serde::{Serialize, Serializer};
use std::fmt::Display;

/// Longest custom path accepted after stripping.
pub const MAX_CUSTOM_LENGTH: usize = 64;

/// The key under which a code is stored and served.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShortPath {
    /// Produced by the allocation sequence; always 1-10 alphabet symbols.
    Generated(String),
    /// Supplied by a caller, reduced to ASCII alphanumerics.
    Custom(String),
}

impl ShortPath {
    /// Wraps an encoded sequence output.
    pub fn generated(code: impl Into<String>) -> Self {
        Self::Generated(code.into())
    }

    /// Strips `input` down to `[A-Za-z0-9]` and wraps the result.
    ///
    /// Returns `None` when nothing is left after stripping, in which case the
    /// caller gets a generated path instead. Fails when the result is longer
    /// than [`MAX_CUSTOM_LENGTH`].
    pub fn custom(input: &str) -> Result<Option<Self>, AllocationError> {
        let stripped = strip_custom(input);

        if stripped.is_empty() {
            return Ok(None);
        }
        if stripped.len() > MAX_CUSTOM_LENGTH {
            return Err(AllocationError::InvalidPath(format!(
                "length must be at most {MAX_CUSTOM_LENGTH}, got {}",
                stripped.len()
            )));
        }

        Ok(Some(Self::Custom(stripped)))
    }

    /// Creates a custom path without stripping or validation.
    ///
    /// Use this only for paths read back from a trusted store.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self::Custom(code.into())
    }

    /// Builds the public URL for this path under `base_url`.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ShortPath::Generated(s) | ShortPath::Custom(s) => s.as_str(),
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ShortPath::Generated(_))
    }
}

/// Removes every character outside `[A-Za-z0-9]`.
pub fn strip_custom(input: &str) -> String {
    input.chars().filter(char::is_ascii_alphanumeric).collect()
}

impl Display for ShortPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ShortPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
