//! Batch resolution of package specs with per-item failure isolation

use std::future::Future;
use std::io::Write;

use tracing::debug;

use crate::version::error::QypiError;
use crate::version::types::{MetadataDocument, PackageSpec};

/// Pulls resolved documents one spec at a time.
///
/// Domain errors are written to the error writer as `<command>: <message>` and skipped. Any
/// other error is handed back to the caller and ends the batch.
pub struct Batch<I, F, W> {
    tokens: I,
    include_prerelease: bool,
    resolve: F,
    command_path: String,
    errors: W,
    failed: bool,
}

impl<I, F, Fut, W> Batch<I, F, W>
where
    I: Iterator,
    I::Item: AsRef<str>,
    F: FnMut(PackageSpec, bool) -> Fut,
    Fut: Future<Output = Result<MetadataDocument, QypiError>>,
    W: Write,
{
    pub fn new<T>(
        tokens: T,
        include_prerelease: bool,
        resolve: F,
        command_path: impl Into<String>,
        errors: W,
    ) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            tokens: tokens.into_iter(),
            include_prerelease,
            resolve,
            command_path: command_path.into(),
            errors,
            failed: false,
        }
    }

    /// Resolve the next spec that succeeds, or return `None` once the tokens run out.
    pub async fn next(&mut self) -> Result<Option<MetadataDocument>, QypiError> {
        while let Some(token) = self.tokens.next() {
            let spec = PackageSpec::parse(token.as_ref());
            debug!("Resolving {}", spec);

            match (self.resolve)(spec, self.include_prerelease).await {
                Ok(doc) => return Ok(Some(doc)),
                Err(e) if e.is_domain() => {
                    writeln!(self.errors, "{}: {}", self.command_path, e)?;
                    self.failed = true;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Whether any spec so far failed with a domain error.
    pub fn failed(&self) -> bool {
        self.failed
    }
}
