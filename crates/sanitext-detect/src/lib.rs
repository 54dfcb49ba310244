//! Sanitext Detection
//!
//! This crate provides deterministic sensitive-data detection:
//! - Built-in rules for emails, phones, IPs, paths, URLs, cards, dates,
//!   API keys, and access tokens
//! - User-supplied rule documents (YAML)
//! - Overlap resolution into a non-overlapping match set

pub mod detector;
pub mod registry;

pub use detector::{luhn_valid, DetectionOutcome, Detector};
pub use registry::{CustomRuleDoc, PatternRegistry, PatternRule};
