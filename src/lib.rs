//! qypi: query and search a Python package index
//!
//! # Modules
//!
//! - [`version`]: Registry access, version ordering and spec resolution
//! - [`batch`]: Resolving many specs with per-item failure isolation
//! - [`output`]: Metadata normalization and JSON rendering
//! - [`cli`]: Command-line parsing and subcommands
//! - [`config`]: Index URL and related constants
//! - [`logging`]: tracing subscriber setup

pub mod batch;
pub mod cli;
pub mod config;
pub mod logging;
pub mod output;
pub mod version;
