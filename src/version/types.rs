//! Data model shared by the registry client, resolver and normalizer

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::version::error::QypiError;

/// A single downloadable artifact as the registry describes it.
pub type FileRecord = Map<String, Value>;

/// A package name, optionally pinned to an exact version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub pinned_version: Option<String>,
}

impl PackageSpec {
    pub fn latest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pinned_version: None,
        }
    }

    /// Parse `name` or `name=version`. Extra `=` signs before the version are ignored, so
    /// `name==version` is accepted too.
    pub fn parse(token: &str) -> Self {
        match token.split_once('=') {
            Some((name, version)) => Self {
                name: name.to_string(),
                pinned_version: Some(version.trim_start_matches('=').to_string()),
            },
            None => Self::latest(token),
        }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pinned_version {
            Some(version) => write!(f, "{}=={}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// Raw JSON API response for a package or a package release.
///
/// Only the keys the resolver and normalizer need are modelled; everything under `info` and in
/// the file records is kept as untyped JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub info: Map<String, Value>,
    #[serde(default)]
    pub releases: BTreeMap<String, Vec<FileRecord>>,
    #[serde(default)]
    pub urls: Vec<FileRecord>,
}

impl MetadataDocument {
    fn info_str(&self, key: &str) -> Option<&str> {
        self.info.get(key).and_then(Value::as_str)
    }

    /// The version the registry considers current for this document.
    pub fn version(&self) -> Option<&str> {
        self.info_str("version")
    }

    pub fn name(&self) -> Option<&str> {
        self.info_str("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.info_str("description")
    }

    /// `project_url`, or `package_url` on responses from the legacy index.
    pub fn project_url(&self) -> Option<&str> {
        self.info_str("project_url")
            .or_else(|| self.info_str("package_url"))
            .filter(|url| !url.is_empty() && *url != "UNKNOWN")
    }
}

/// Earliest `upload_time` across a release's files.
///
/// Upload times are ISO 8601 strings, so string order is chronological order.
pub fn first_upload(files: &[FileRecord]) -> Option<String> {
    files
        .iter()
        .filter_map(|file| file.get("upload_time").and_then(Value::as_str))
        .min()
        .map(str::to_string)
}

/// Fields the XML-RPC `search` method accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Name,
    Version,
    Author,
    AuthorEmail,
    Maintainer,
    MaintainerEmail,
    HomePage,
    License,
    Summary,
    Description,
    Keywords,
    Platform,
    DownloadUrl,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Version => "version",
            SearchField::Author => "author",
            SearchField::AuthorEmail => "author_email",
            SearchField::Maintainer => "maintainer",
            SearchField::MaintainerEmail => "maintainer_email",
            SearchField::HomePage => "home_page",
            SearchField::License => "license",
            SearchField::Summary => "summary",
            SearchField::Description => "description",
            SearchField::Keywords => "keywords",
            SearchField::Platform => "platform",
            SearchField::DownloadUrl => "download_url",
        }
    }
}

impl FromStr for SearchField {
    type Err = QypiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SearchField::Name),
            "version" => Ok(SearchField::Version),
            "author" => Ok(SearchField::Author),
            "author_email" => Ok(SearchField::AuthorEmail),
            "maintainer" => Ok(SearchField::Maintainer),
            "maintainer_email" => Ok(SearchField::MaintainerEmail),
            // `url` reads better on the command line
            "home_page" | "url" => Ok(SearchField::HomePage),
            "license" => Ok(SearchField::License),
            "summary" => Ok(SearchField::Summary),
            "description" => Ok(SearchField::Description),
            "keywords" => Ok(SearchField::Keywords),
            "platform" => Ok(SearchField::Platform),
            "download_url" => Ok(SearchField::DownloadUrl),
            other => Err(QypiError::InvalidSearchField(other.to_string())),
        }
    }
}

/// Search terms grouped by field, in the order fields were first mentioned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    terms: IndexMap<SearchField, Vec<String>>,
}

impl SearchQuery {
    /// Build a query from `field:term` tokens. Tokens without a colon search descriptions.
    pub fn from_terms<I, S>(terms: I) -> Result<Self, QypiError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut query = Self::default();
        for term in terms {
            let term = term.as_ref();
            let (field, value) = match term.split_once(':') {
                Some((field, value)) => (field.parse()?, value),
                None => (SearchField::Description, term),
            };
            query.push(field, value);
        }
        Ok(query)
    }

    pub fn push(&mut self, field: SearchField, term: impl Into<String>) {
        self.terms.entry(field).or_default().push(term.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (SearchField, &[String])> {
        self.terms.iter().map(|(field, terms)| (*field, terms.as_slice()))
    }
}
