//! ISO 3166-1 alpha-2 country codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TariffError};

/// Canonical (upper-case) two-letter country code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// Parse and canonicalize. Surrounding whitespace is ignored, case is not significant.
    pub fn parse(raw: &str) -> Result<Self> {
        let s = raw.trim();
        match s.as_bytes() {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                Ok(Self([a.to_ascii_uppercase(), b.to_ascii_uppercase()]))
            }
            [] => Err(TariffError::InvalidRule("country code must not be empty".into())),
            _ => Err(TariffError::InvalidRule(format!(
                "country code must be two ASCII letters: {raw:?}"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        // Both bytes are ASCII letters by construction.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CountryCode {
    type Err = TariffError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = TariffError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<CountryCode> for String {
    fn from(c: CountryCode) -> Self {
        c.as_str().to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_to_upper_case() {
        assert_eq!(CountryCode::parse("us").unwrap().as_str(), "US");
        assert_eq!(CountryCode::parse(" tW ").unwrap().to_string(), "TW");
    }

    #[test]
    fn rejects_malformed_codes() {
        for bad in ["", "   ", "U", "USA", "U1", "ü1", "--"] {
            let err = CountryCode::parse(bad).unwrap_err();
            assert_eq!(err.code().as_str(), "INVALID_RULE", "input={bad:?}");
        }
    }

    #[test]
    fn serde_uses_plain_string() {
        let c: CountryCode = serde_json::from_str("\"de\"").unwrap();
        assert_eq!(c.as_str(), "DE");
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"DE\"");
        assert!(serde_json::from_str::<CountryCode>("\"D\"").is_err());
    }
}
