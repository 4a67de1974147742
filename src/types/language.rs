use std::{fmt::Display, ops::Deref, str::FromStr};

use tracing::warn;

use crate::result::{Error, Result};

/// A subtitle language code as understood by the download tool (e.g. `en`, `pt-BR`, `zh-Hans`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LanguageCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        // A 2-3 letters primary tag, then optional alphanumeric subtags
        let mut parts = s.split('-');
        let primary_ok = parts
            .next()
            .is_some_and(|p| (2..=3).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_alphabetic()));
        let subtags_ok =
            parts.all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_alphanumeric()));

        if primary_ok && subtags_ok {
            Ok(Self(s.to_owned()))
        } else {
            Err(Error::InvalidLanguage(s.to_owned()))
        }
    }
}

impl Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered list of wanted languages. The first available one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePreferences(Vec<LanguageCode>);

impl LanguagePreferences {
    pub fn new(languages: Vec<LanguageCode>) -> Self {
        let mut unique: Vec<LanguageCode> = Vec::with_capacity(languages.len());
        for lang in languages {
            if unique.contains(&lang) {
                warn!("Language '{lang}' given more than once, keeping its first position");
            } else {
                unique.push(lang);
            }
        }
        Self(unique)
    }
}

impl FromStr for LanguagePreferences {
    type Err = Error;

    /// Parse a comma-separated list, e.g. `hi,en`
    fn from_str(s: &str) -> Result<Self> {
        let languages = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(LanguageCode::from_str)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(languages))
    }
}

impl Deref for LanguagePreferences {
    type Target = [LanguageCode];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for LanguagePreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<&str> = self.0.iter().map(LanguageCode::as_str).collect();
        f.write_str(&codes.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordered_list() {
        let prefs: LanguagePreferences = "es, en ,hi".parse().unwrap();
        let codes: Vec<&str> = prefs.iter().map(LanguageCode::as_str).collect();
        assert_eq!(codes, ["es", "en", "hi"]);
    }

    #[test]
    fn accepts_region_and_script_subtags() {
        assert!("pt-BR".parse::<LanguageCode>().is_ok());
        assert!("zh-Hans".parse::<LanguageCode>().is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "e".parse::<LanguageCode>(),
            Err(Error::InvalidLanguage(_))
        ));
        assert!("english".parse::<LanguageCode>().is_err());
        assert!("en-".parse::<LanguageCode>().is_err());
        assert!("hi,en;rm".parse::<LanguagePreferences>().is_err());
    }

    #[test]
    fn duplicates_keep_first_position() {
        let prefs: LanguagePreferences = "en,hi,en".parse().unwrap();
        assert_eq!(prefs.to_string(), "en,hi");
    }

    #[test]
    fn empty_input_gives_empty_list() {
        let prefs: LanguagePreferences = " , ".parse().unwrap();
        assert!(prefs.is_empty());
    }
}
