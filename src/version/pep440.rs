//! Tolerant PEP 440 version model
//!
//! Registry keys are almost always valid PEP 440, but old uploads carry arbitrary strings.
//! Parsing never fails: anything PEP 440 rejects becomes a [`ParsedVersion::Legacy`] value that
//! sorts below every real version.

use std::fmt;
use std::str::FromStr;

use pep508_rs::pep440_rs::Version;
use tracing::trace;

/// A version string parsed into a totally ordered value.
///
/// Variant order matters: the derived `Ord` places every `Legacy` before every `Pep440`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParsedVersion {
    Legacy(String),
    Pep440(Version),
}

impl ParsedVersion {
    pub fn parse(version: &str) -> Self {
        match Version::from_str(version.trim()) {
            Ok(parsed) => ParsedVersion::Pep440(parsed),
            Err(e) => {
                trace!("Treating '{}' as a legacy version: {}", version, e);
                ParsedVersion::Legacy(version.to_string())
            }
        }
    }

    /// True for alpha, beta, release candidate and development releases.
    pub fn is_prerelease(&self) -> bool {
        match self {
            ParsedVersion::Pep440(version) => version.is_pre() || version.is_dev(),
            ParsedVersion::Legacy(_) => false,
        }
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedVersion::Pep440(version) => write!(f, "{}", version),
            ParsedVersion::Legacy(raw) => f.write_str(raw),
        }
    }
}

/// Sort version strings ascending by parsed value, keeping the original spellings.
pub fn sort_versions<S: AsRef<str>>(versions: &[S]) -> Vec<String> {
    let mut parsed: Vec<(ParsedVersion, &str)> = versions
        .iter()
        .map(|v| (ParsedVersion::parse(v.as_ref()), v.as_ref()))
        .collect();
    parsed.sort_by(|(a, _), (b, _)| a.cmp(b));
    parsed.into_iter().map(|(_, v)| v.to_string()).collect()
}

/// Find the greatest stable version and return its original key.
///
/// The key is returned as given rather than re-rendered from the parsed value, so a follow-up
/// request targets exactly the spelling the registry listed.
pub fn max_stable<'a, I>(keys: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .map(|key| (ParsedVersion::parse(key), key))
        .filter(|(parsed, _)| !parsed.is_prerelease())
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, key)| key)
}
