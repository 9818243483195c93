//! Output shaping
//!
//! - [`normalize`]: Reshapes registry records into a stable schema
//! - [`json`]: Deterministic JSON rendering

pub mod json;
pub mod normalize;
