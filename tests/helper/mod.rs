//! Shared test utilities

#![allow(dead_code)]

pub mod registry;

pub use registry::*;
