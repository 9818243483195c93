use thiserror::Error;

/// Failures talking to the index itself. None of these are recoverable per package.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },
}

#[derive(Debug, Error)]
pub enum QypiError {
    #[error("{0}: package not found")]
    PackageNotFound(String),

    #[error("{package}: version {version} not found")]
    VersionNotFound { package: String, version: String },

    #[error("{0}: no stable versions available")]
    NoStableVersion(String),

    #[error("unknown search field: {0}")]
    InvalidSearchField(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QypiError {
    /// Domain errors describe an absent package or version. A batch reports them and moves on.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            QypiError::PackageNotFound(_)
                | QypiError::VersionNotFound { .. }
                | QypiError::NoStableVersion(_)
        )
    }
}
