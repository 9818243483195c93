//! Registry implementations for fetching package metadata

pub mod pypi;
pub mod xmlrpc;

pub use pypi::PypiRegistry;
