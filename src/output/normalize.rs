//! Reshaping of raw registry records into qypi's output schema

use serde::Serialize;
use serde_json::{Map, Value};

use crate::version::pep440::{ParsedVersion, sort_versions};
use crate::version::types::{FileRecord, MetadataDocument, first_upload};

/// Key prefixes of deprecated analytics fields that never reach the output.
pub const RESERVED_PREFIXES: [&str; 2] = ["cheesecake", "_pypi"];

/// Values the registry uses to mean "not set".
const NULL_SENTINELS: [&str; 2] = ["", "UNKNOWN"];

/// Extra keys removed from file records: dead download counters and server paths.
const FILE_DROP_KEYS: [&str; 2] = ["downloads", "path"];

/// Drop reserved and `drop_keys` entries and turn sentinel strings into `null`.
///
/// Only top-level values are inspected; nested arrays and objects are kept as they are.
pub fn clean_dict(record: &Map<String, Value>, drop_keys: &[&str]) -> Map<String, Value> {
    record
        .iter()
        .filter(|(key, _)| {
            !RESERVED_PREFIXES
                .iter()
                .any(|prefix| key.starts_with(prefix))
                && !drop_keys.contains(&key.as_str())
        })
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) if NULL_SENTINELS.contains(&s.as_str()) => Value::Null,
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// [`clean_dict`] for file distribution records.
pub fn clean_file(record: &FileRecord) -> FileRecord {
    clean_dict(record, &FILE_DROP_KEYS)
}

/// Normalized `info` record for the `info` command.
pub fn normalize_info(doc: &MetadataDocument) -> Map<String, Value> {
    // The description is what `readme` prints; it would drown the rest of the record.
    let mut info = clean_dict(&doc.info, &["description", "downloads"]);

    let url = info.remove("home_page").unwrap_or(Value::Null);
    info.insert("url".to_string(), url);
    info.insert(
        "release_date".to_string(),
        first_upload(&doc.urls).map_or(Value::Null, Value::String),
    );

    let mut people = Vec::new();
    for role in ["author", "maintainer"] {
        let name = info.remove(role).unwrap_or(Value::Null);
        let email = info.remove(&format!("{role}_email")).unwrap_or(Value::Null);
        if !name.is_null() || !email.is_null() {
            people.push(serde_json::json!({
                "name": name,
                "email": email,
                "role": role,
            }));
        }
    }
    info.insert("people".to_string(), Value::Array(people));

    // Legacy PyPI called it package_url; Warehouse calls it project_url.
    if !info.contains_key("project_url")
        && let Some(package_url) = info.remove("package_url")
    {
        info.insert("project_url".to_string(), package_url);
    }

    info
}

/// One entry of the `releases` listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseEntry {
    pub version: String,
    pub is_prerelease: bool,
    pub release_date: Option<String>,
    pub release_url: Option<String>,
}

/// Every release of a package, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseListing {
    pub name: Option<String>,
    pub releases: Vec<ReleaseEntry>,
}

pub fn release_listing(doc: &MetadataDocument) -> ReleaseListing {
    let base_url = doc.project_url().map(|url| {
        if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        }
    });

    let versions: Vec<&str> = doc.releases.keys().map(String::as_str).collect();
    let releases = sort_versions(&versions)
        .into_iter()
        .map(|version| {
            let files = doc.releases.get(&version).map(Vec::as_slice).unwrap_or_default();
            ReleaseEntry {
                is_prerelease: ParsedVersion::parse(&version).is_prerelease(),
                release_date: first_upload(files),
                release_url: base_url.as_ref().map(|base| format!("{base}{version}")),
                version,
            }
        })
        .collect();

    ReleaseListing {
        name: doc
            .name()
            .filter(|name| !NULL_SENTINELS.contains(name))
            .map(str::to_string),
        releases,
    }
}
