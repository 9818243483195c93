//! Registry trait for fetching package metadata from a package index

#[cfg(test)]
use mockall::automock;

use serde_json::{Map, Value};

use crate::version::error::{QypiError, RegistryError};
use crate::version::types::{MetadataDocument, SearchQuery};

/// Trait for the JSON and XML-RPC surfaces of a package index
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches the metadata document for the registry's current version of a package
    ///
    /// # Returns
    /// * `Ok(MetadataDocument)` - `info` describes the current version, `releases` lists every version
    /// * `Err(QypiError::PackageNotFound)` - If the index does not know the package
    /// * `Err(QypiError::Registry)` - For any other failure
    async fn fetch_latest(&self, package_name: &str) -> Result<MetadataDocument, QypiError>;

    /// Fetches the metadata document for one release of a package
    ///
    /// # Returns
    /// * `Ok(MetadataDocument)` - `urls` lists the files of that release
    /// * `Err(QypiError::VersionNotFound)` - If the index does not know the package or version
    /// * `Err(QypiError::Registry)` - For any other failure
    async fn fetch_version(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<MetadataDocument, QypiError>;

    /// Lists the name of every package on the index
    async fn list_packages(&self) -> Result<Vec<String>, RegistryError>;

    /// Runs a field search, returning one record per matching release
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Map<String, Value>>, RegistryError>;

    /// Lists `(name, version)` pairs of releases carrying all of the given classifiers
    async fn browse(
        &self,
        classifiers: &[String],
    ) -> Result<Vec<(String, Option<String>)>, RegistryError>;
}
