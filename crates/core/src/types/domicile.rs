//! Supported account domiciles.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::LanguageTag;

/// Error returned for a country code that isn't a supported [`Domicile`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported domicile: {0}")]
pub struct DomicileError(pub String);

/// The country an account is domiciled in (ISO 3166 alpha-2).
///
/// Only the domiciles the ecosystem operates in are supported. Each one
/// carries the language used when an account has no preferred locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Domicile {
    /// Slovakia.
    #[default]
    Sk,
    /// Czech Republic.
    Cz,
}

impl Domicile {
    /// All supported domiciles.
    pub const ALL: [Self; 2] = [Self::Sk, Self::Cz];

    /// Returns the uppercase ISO 3166 alpha-2 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Sk => "SK",
            Self::Cz => "CZ",
        }
    }

    /// Returns the domicile's default language.
    #[must_use]
    pub fn language(self) -> LanguageTag {
        let code = match self {
            Self::Sk => "sk",
            Self::Cz => "cs",
        };
        LanguageTag::from_static(code)
    }
}

impl fmt::Display for Domicile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Domicile {
    type Err = DomicileError;

    /// Case-insensitive lookup by country code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| DomicileError(s.to_owned()))
    }
}

impl TryFrom<String> for Domicile {
    type Error = DomicileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Domicile> for String {
    fn from(domicile: Domicile) -> Self {
        domicile.code().to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_slovakia() {
        assert_eq!(Domicile::default(), Domicile::Sk);
        assert_eq!(Domicile::default().language().as_str(), "sk");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("cz".parse::<Domicile>().unwrap(), Domicile::Cz);
        assert_eq!(" Sk ".parse::<Domicile>().unwrap(), Domicile::Sk);
    }

    #[test]
    fn test_parse_unsupported() {
        let err = "HU".parse::<Domicile>().unwrap_err();
        assert_eq!(err, DomicileError("HU".to_owned()));
        assert!("".parse::<Domicile>().is_err());
    }

    #[test]
    fn test_languages() {
        assert_eq!(Domicile::Cz.language().as_str(), "cs");
    }

    #[test]
    fn test_serde_uses_code() {
        assert_eq!(serde_json::to_string(&Domicile::Cz).unwrap(), "\"CZ\"");
        assert_eq!(
            serde_json::from_str::<Domicile>("\"sk\"").unwrap(),
            Domicile::Sk
        );
    }
}
