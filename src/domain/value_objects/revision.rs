use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Revision関連のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevisionError {
    #[error("Invalid revision number: {0}")]
    InvalidNumber(String),

    #[error("Invalid revision specifier: {0}")]
    InvalidSpecifier(String),
}

/// A point in repository history, as reported by `svn log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(u64);

impl RevisionId {
    pub fn new(number: u64) -> Self {
        Self(number)
    }

    pub fn number(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RevisionId {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('r').unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| RevisionError::InvalidNumber(s.to_string()))
    }
}

/// Revision specifier accepted by `svn -r`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionSpec {
    /// The repository head
    Head,
    /// A fixed revision number
    Number(RevisionId),
    /// A date in svn's `{...}` form, stored without braces
    Date(String),
}

impl From<RevisionId> for RevisionSpec {
    fn from(id: RevisionId) -> Self {
        Self::Number(id)
    }
}

impl fmt::Display for RevisionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionSpec::Head => write!(f, "HEAD"),
            RevisionSpec::Number(id) => write!(f, "{}", id),
            RevisionSpec::Date(date) => write!(f, "{{{}}}", date),
        }
    }
}

impl FromStr for RevisionSpec {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("head") {
            return Ok(Self::Head);
        }
        if let Some(date) = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            if date.is_empty() || date.contains(['{', '}']) {
                return Err(RevisionError::InvalidSpecifier(s.to_string()));
            }
            return Ok(Self::Date(date.to_string()));
        }
        trimmed
            .parse::<RevisionId>()
            .map(Self::Number)
            .map_err(|_| RevisionError::InvalidSpecifier(s.to_string()))
    }
}

impl Serialize for RevisionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RevisionSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // YAML may hand us a bare integer
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::Number(RevisionId::new(n))),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}
