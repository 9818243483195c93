//! Version resolution layer
//!
//! Fetches package metadata from an index and decides which release a package spec refers to.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│  Resolver   │◀────│   PEP 440   │
//! │  (fetch)    │     │  (select)   │     │ (version cmp)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ Registries  │
//! │(JSON,XMLRPC)│
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`error`]: Domain and transport error types
//! - [`pep440`]: Tolerant version parsing and ordering
//! - [`registry`]: Registry trait for fetching metadata from remote sources
//! - [`registries`]: Concrete registry implementation for PyPI and its XML-RPC codec
//! - [`resolver`]: Turns a package spec into a metadata document
//! - [`types`]: Package specs, metadata documents and search queries

pub mod error;
pub mod pep440;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod types;
