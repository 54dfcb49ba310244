//! Sanitext Engine
//!
//! Orchestrates the detection-and-substitution pipeline and the encrypted
//! recovery subsystem:
//! - `sanitize` / `recover` / `preview` over in-memory text
//! - Batch file jobs on bounded workers with atomic output promotion

pub mod jobs;
pub mod pipeline;

pub use jobs::{recover_file, sanitize_files, JobConfig, SanitizedFile};
pub use pipeline::{
    preview, recover, sanitize, CategoryFilter, PreviewStats, SanitizeOptions,
};
