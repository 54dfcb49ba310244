//! Sanitext Replacement
//!
//! This crate turns a resolved match set into sanitized text and back:
//! - Dummy value generation with per-category counters
//! - Bidirectional mapping construction
//! - Forward and reverse substitution

pub mod generator;
pub mod mapping;
pub mod substitute;

pub use generator::DummyGenerator;
pub use mapping::{build_mapping, MappingTable};
