//! Sanitext Core Types
//!
//! This crate provides the fundamental types used throughout Sanitext:
//! - Detection and mapping types shared by the pipeline stages
//! - The error taxonomy for sanitize and recover operations

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    Category, Detection, IntegrityVerdict, MappingEntry, SanitizationResult,
};
