use regex::Regex;
use std::{fmt::Display, str::FromStr};

use crate::errors::{BandscaleError, Result};

/// Picks bands of an image by name.
///
/// Plain names (letters, digits, `_`, `-`) match exactly. Anything else is a
/// regular expression that must match the whole band name, so `SR_B.` picks
/// `SR_B1`..`SR_B7` but not `SR_QA_AEROSOL`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BandSelector {
    Name(String),
    Pattern { source: String, regex: Regex },
}

impl BandSelector {
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Ok(Self::Name(pattern.to_string()));
        }
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self::Pattern {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, band_name: &str) -> bool {
        match self {
            Self::Name(name) => name == band_name,
            Self::Pattern { regex, .. } => regex.is_match(band_name),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Pattern { source, .. } => source,
        }
    }
}

impl PartialEq for BandSelector {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Display for BandSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BandSelector {
    type Err = BandscaleError;
    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for BandSelector {
    type Error = BandscaleError;
    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<BandSelector> for String {
    fn from(value: BandSelector) -> Self {
        value.as_str().to_string()
    }
}
