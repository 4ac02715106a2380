//! Preferred account language.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`LanguageTag`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageTagError {
    /// The input string is empty.
    #[error("language tag cannot be empty")]
    Empty,
    /// The language subtag is not an ISO 639 alpha-2 or alpha-3 code.
    #[error("invalid language code: {0}")]
    InvalidLanguage(String),
    /// The region subtag is neither an ISO 3166 alpha-2 code nor a UN M.49 number.
    #[error("invalid region code: {0}")]
    InvalidRegion(String),
}

/// A language tag made of an ISO 639 language and an optional region.
///
/// Both `-` and `_` are accepted as separator. The language is lowercased and
/// the region uppercased, so `en_gb`, `EN-gb` and `en-GB` are all equal.
///
/// ```
/// use steward_link_core::LanguageTag;
///
/// let tag: LanguageTag = "en_gb".parse().unwrap();
/// assert_eq!(tag.as_str(), "en-GB");
/// assert_eq!(tag.language(), "en");
/// assert_eq!(tag.region(), Some("GB"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Parse a language tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or its subtags are malformed.
    pub fn parse(s: &str) -> Result<Self, LanguageTagError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LanguageTagError::Empty);
        }

        let mut parts = s.splitn(2, ['-', '_']);
        let language = parts.next().unwrap_or_default();
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(LanguageTagError::InvalidLanguage(language.to_owned()));
        }

        let mut tag = language.to_ascii_lowercase();
        if let Some(region) = parts.next() {
            let alpha = region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic());
            let numeric = region.len() == 3 && region.chars().all(|c| c.is_ascii_digit());
            if !alpha && !numeric {
                return Err(LanguageTagError::InvalidRegion(region.to_owned()));
            }
            tag.push('-');
            tag.push_str(&region.to_ascii_uppercase());
        }

        Ok(Self(tag))
    }

    /// Wraps a tag already known to be in normalized form.
    pub(crate) fn from_static(tag: &'static str) -> Self {
        Self(tag.to_owned())
    }

    /// Returns the normalized tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the language subtag.
    #[must_use]
    pub fn language(&self) -> &str {
        self.0.split_once('-').map_or(self.0.as_str(), |(lang, _)| lang)
    }

    /// Returns the region subtag, if any.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.0.split_once('-').map(|(_, region)| region)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for LanguageTag {
    type Err = LanguageTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = LanguageTagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.0
    }
}
