//! Package spec resolution
//!
//! Turns `name` or `name=version` into the metadata document it refers to, skipping
//! pre-releases unless asked not to.

use std::sync::Arc;

use tracing::{debug, info};

use crate::version::error::{QypiError, RegistryError};
use crate::version::pep440::{ParsedVersion, max_stable};
use crate::version::registry::Registry;
use crate::version::types::{MetadataDocument, PackageSpec};

/// Resolves package specs against a single registry.
#[derive(Clone)]
pub struct PackageResolver {
    registry: Arc<dyn Registry>,
}

impl PackageResolver {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    /// Get the registry used for fetching metadata
    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    /// Resolve a spec to a metadata document.
    ///
    /// A pinned version is fetched as written. Otherwise the registry's current version is used,
    /// unless it is a pre-release and `include_prerelease` is false, in which case the greatest
    /// stable release is fetched instead.
    pub async fn resolve(
        &self,
        spec: &PackageSpec,
        include_prerelease: bool,
    ) -> Result<MetadataDocument, QypiError> {
        if let Some(version) = &spec.pinned_version {
            debug!("Fetching pinned release {}", spec);
            return self.registry.fetch_version(&spec.name, version).await;
        }

        let doc = self.registry.fetch_latest(&spec.name).await?;
        let current = doc.version().ok_or_else(|| {
            RegistryError::InvalidResponse(format!("{}: metadata has no info.version", spec.name))
        })?;

        if include_prerelease || !ParsedVersion::parse(current).is_prerelease() {
            return Ok(doc);
        }

        let Some(stable) = max_stable(doc.releases.keys().map(String::as_str)) else {
            return Err(QypiError::NoStableVersion(spec.name.clone()));
        };

        info!(
            "{}: current version {} is a pre-release, using {}",
            spec.name, current, stable
        );
        self.registry.fetch_version(&spec.name, stable).await
    }
}
