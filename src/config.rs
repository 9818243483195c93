//! Configuration for qypi
//!
//! The only setting is the index URL. It comes from `--index-url`, then `PIP_INDEX_URL`, then
//! [`DEFAULT_INDEX_URL`]; clap resolves that precedence when parsing the command line.

/// Root of the public PyPI JSON and XML-RPC APIs
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";

/// Environment variable pip uses for its index, honoured here too
pub const INDEX_URL_ENV: &str = "PIP_INDEX_URL";

/// User-Agent sent with every registry request
pub const USER_AGENT: &str = concat!("qypi/", env!("CARGO_PKG_VERSION"));

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub index_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
        }
    }
}

impl Config {
    pub fn new(index_url: impl Into<String>) -> Self {
        Self {
            index_url: index_url.into(),
        }
    }
}
