//! Validated ticker symbols.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TrancheError;

const MAX_LEN: usize = 32;

/// A validated upper-case ticker symbol such as `AAPL`, `BRK-B`, `^GSPC`
/// or `EURUSD=X`.
///
/// Accepted characters are ASCII upper-case letters, digits and `.`, `-`,
/// `^`, `=`. In particular a ticker can never contain `:`, the cache key
/// separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Validate and wrap a symbol.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the symbol is empty, longer than 32 characters,
    /// or contains a character outside the accepted set.
    pub fn new(symbol: impl Into<String>) -> Result<Self, TrancheError> {
        let symbol = symbol.into();
        if symbol.is_empty() || symbol.len() > MAX_LEN {
            return Err(TrancheError::InvalidArg(format!(
                "ticker must be 1..={MAX_LEN} characters, got {:?}",
                symbol
            )));
        }
        if let Some(bad) = symbol.chars().find(|c| !Self::allowed(*c)) {
            return Err(TrancheError::InvalidArg(format!(
                "ticker {symbol:?} contains invalid character {bad:?}"
            )));
        }
        Ok(Self(symbol))
    }

    const fn allowed(c: char) -> bool {
        c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '^' | '=')
    }

    /// Borrow the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = TrancheError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = TrancheError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::str::FromStr for Ticker {
    type Err = TrancheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<Ticker> for String {
    fn from(t: Ticker) -> Self {
        t.0
    }
}
