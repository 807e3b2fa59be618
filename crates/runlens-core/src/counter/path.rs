use std::{borrow::Borrow, fmt, str::FromStr};

use crate::counter::CounterError;

/// Separator between nesting levels of a counter path.
pub const PATH_SEPARATOR: char = '.';

/// Validated counter path: one or more non-empty segments joined by [`PATH_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricPath(String);

impl MetricPath {
    /// Parse and validate a dot-delimited path.
    pub fn parse(s: impl Into<String>) -> Result<Self, CounterError> {
        let s = s.into();
        if s.split(PATH_SEPARATOR).any(str::is_empty) {
            return Err(CounterError::InvalidPath(s));
        }
        Ok(Self(s))
    }

    /// Append one nesting level.
    ///
    /// The segment is taken literally: it must not contain the separator.
    pub fn join(&self, segment: &str) -> Result<Self, CounterError> {
        if segment.is_empty() || segment.contains(PATH_SEPARATOR) {
            return Err(CounterError::InvalidSegment(segment.to_string()));
        }
        Ok(Self(format!("{}{PATH_SEPARATOR}{segment}", self.0)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of nesting levels.
    pub fn depth(&self) -> usize {
        self.0.split(PATH_SEPARATOR).count()
    }
}

impl fmt::Display for MetricPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MetricPath {
    type Err = CounterError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Borrow<str> for MetricPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MetricPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
