//! The sanitize and recover pipelines
//!
//! Sanitize: Detecting -> Generating -> Substituting -> Encrypting.
//! Recover: Decrypting -> Reversing -> Verifying.
//! Each stage fails straight to a typed error; nothing is retried.

use sanitext_core::{
    Category, Detection, Error, IntegrityVerdict, Result, SanitizationResult,
};
use sanitext_detect::{Detector, PatternRegistry};
use sanitext_replace::{build_mapping, substitute, DummyGenerator};
use sanitext_vault::codec::{self, RecoveryArtifact};
use sanitext_vault::{integrity, DEFAULT_ITERATIONS};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which categories detection runs against
#[derive(Debug, Clone, Default)]
pub enum CategoryFilter {
    /// Every rule in the registry
    #[default]
    All,

    /// Only rules for these categories
    Only(HashSet<Category>),
}

impl CategoryFilter {
    fn as_set(&self) -> Option<&HashSet<Category>> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(set) => Some(set),
        }
    }
}

/// Options recognized by `sanitize` and `preview`
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Custom pattern document to merge into the registry
    pub custom_pattern_source: Option<PathBuf>,

    /// PBKDF2 iteration count for the recovery artifact
    pub iteration_count: u32,

    /// Category subset, or all
    pub enabled_categories: CategoryFilter,

    /// Deadline for the whole operation
    pub timeout: Option<Duration>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            custom_pattern_source: None,
            iteration_count: DEFAULT_ITERATIONS,
            enabled_categories: CategoryFilter::All,
            timeout: None,
        }
    }
}

/// Detection statistics for a preview run
#[derive(Debug, Clone, Default)]
pub struct PreviewStats {
    pub total_detections: usize,
    pub by_category: HashMap<Category, usize>,
    pub warnings: Vec<String>,
}

/// Build the pattern registry an operation will use
pub fn load_registry(options: &SanitizeOptions) -> Result<PatternRegistry> {
    PatternRegistry::load(
        options.custom_pattern_source.as_deref(),
        options.enabled_categories.as_set(),
    )
}

/// Sanitize `text`, producing the sanitized output and the encrypted
/// recovery artifact
pub fn sanitize(
    text: &str,
    password: &str,
    options: &SanitizeOptions,
) -> Result<(SanitizationResult, RecoveryArtifact)> {
    let registry = load_registry(options)?;
    sanitize_with_registry(&registry, text, password, options)
}

/// Sanitize with a prebuilt registry. Batch jobs share one read-only
/// registry across workers; everything else here is per-call state.
pub fn sanitize_with_registry(
    registry: &PatternRegistry,
    text: &str,
    password: &str,
    options: &SanitizeOptions,
) -> Result<(SanitizationResult, RecoveryArtifact)> {
    let started = Instant::now();

    debug!(stage = "detecting", bytes = text.len(), "sanitize started");
    let outcome = Detector::new(registry).detect(text);
    for warning in &outcome.warnings {
        warn!(%warning, "detection ambiguity");
    }
    check_deadline(started, options.timeout)?;

    debug!(stage = "generating", matches = outcome.detections.len(), "matches resolved");
    let generator = DummyGenerator::with_templates(registry.user_templates()).for_text(text);
    let (table, substitutes) = build_mapping(&outcome.detections, generator);
    check_deadline(started, options.timeout)?;

    debug!(stage = "substituting", entries = table.entries().len(), "mapping built");
    let sanitized_text = substitute::apply(text, &outcome.detections, &substitutes);
    check_deadline(started, options.timeout)?;

    debug!(stage = "encrypting", iterations = options.iteration_count, "sealing artifact");
    let content_checksum = integrity::checksum(text);
    let artifact = codec::seal(
        table.entries(),
        &content_checksum,
        password,
        options.iteration_count,
    )?;

    let counts = count_by_category(&outcome.detections);
    let elapsed = started.elapsed();
    info!(
        matches = outcome.detections.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "sanitize complete"
    );

    Ok((
        SanitizationResult {
            sanitized_text,
            entries: table.into_entries(),
            counts,
            warnings: outcome.warnings,
            elapsed,
        },
        artifact,
    ))
}

/// Restore original text from sanitized text and a recovery artifact.
/// The restored text is returned even when the integrity verdict fails,
/// so callers can decide whether to trust a best-effort restoration.
pub fn recover(
    sanitized_text: &str,
    artifact: &RecoveryArtifact,
    password: &str,
) -> Result<(String, IntegrityVerdict)> {
    debug!(stage = "decrypting", "recover started");
    let (entries, stored_checksum) = codec::open(artifact, password)?;

    debug!(stage = "reversing", entries = entries.len(), "mapping decrypted");
    let restored = substitute::restore(sanitized_text, &entries)?;

    debug!(stage = "verifying", "restoration complete");
    let verdict = integrity::verify(&stored_checksum, &restored);
    if verdict.passed {
        info!("recover complete, integrity verified");
    } else {
        warn!(
            expected = %verdict.expected,
            actual = %verdict.actual,
            "restored text does not match the original checksum"
        );
    }

    Ok((restored, verdict))
}

/// Detection dry run: what would be replaced, without replacing anything
pub fn preview(text: &str, options: &SanitizeOptions) -> Result<(Vec<Detection>, PreviewStats)> {
    let registry = load_registry(options)?;
    let outcome = Detector::new(&registry).detect(text);

    let stats = PreviewStats {
        total_detections: outcome.detections.len(),
        by_category: count_by_category(&outcome.detections),
        warnings: outcome.warnings,
    };

    Ok((outcome.detections, stats))
}

fn count_by_category(detections: &[Detection]) -> HashMap<Category, usize> {
    let mut counts = HashMap::new();
    for detection in detections {
        *counts.entry(detection.category.clone()).or_insert(0) += 1;
    }
    counts
}

fn check_deadline(started: Instant, timeout: Option<Duration>) -> Result<()> {
    match timeout {
        Some(limit) if started.elapsed() > limit => Err(Error::Timeout(limit.as_secs())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_options() -> SanitizeOptions {
        SanitizeOptions {
            iteration_count: 1_000,
            ..Default::default()
        }
    }

    #[test]
    fn example_line_sanitizes_as_documented() {
        let options = SanitizeOptions {
            enabled_categories: CategoryFilter::Only(
                [Category::Email, Category::IpAddress].into_iter().collect(),
            ),
            ..fast_options()
        };

        let (result, _artifact) = sanitize(
            "Contact me at alice@example.com or 192.168.1.50",
            "hunter2",
            &options,
        )
        .unwrap();

        assert_eq!(
            result.sanitized_text,
            "Contact me at user001@example.com or 10.0.0.1"
        );
        assert_eq!(result.counts[&Category::Email], 1);
        assert_eq!(result.counts[&Category::IpAddress], 1);
    }

    #[test]
    fn round_trip_restores_exact_bytes() {
        let text = "Contact me at alice@example.com or 192.168.1.50";
        let (result, artifact) = sanitize(text, "hunter2", &fast_options()).unwrap();

        let (restored, verdict) = recover(&result.sanitized_text, &artifact, "hunter2").unwrap();
        assert_eq!(restored, text);
        assert!(verdict.passed);
    }

    #[test]
    fn empty_input_round_trips() {
        let (result, artifact) = sanitize("", "hunter2", &fast_options()).unwrap();
        assert_eq!(result.sanitized_text, "");
        assert!(result.entries.is_empty());

        let (restored, verdict) = recover("", &artifact, "hunter2").unwrap();
        assert_eq!(restored, "");
        assert!(verdict.passed);
    }

    #[test]
    fn wrong_password_fails_recovery() {
        let (result, artifact) =
            sanitize("mail alice@example.com", "hunter2", &fast_options()).unwrap();

        let err = recover(&result.sanitized_text, &artifact, "wrong").unwrap_err();
        assert!(matches!(err, Error::Decryption));
    }

    #[test]
    fn edited_sanitized_text_fails_reversal() {
        let (result, artifact) =
            sanitize("mail alice@example.com", "hunter2", &fast_options()).unwrap();

        // Remove the substitute entirely
        let edited = result.sanitized_text.replace("user001@example.com", "");
        let err = recover(&edited, &artifact, "hunter2").unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn preview_does_not_substitute() {
        let (detections, stats) =
            preview("mail alice@example.com from 192.168.1.50", &fast_options()).unwrap();
        assert_eq!(stats.total_detections, detections.len());
        assert!(stats.by_category.contains_key(&Category::Email));
    }

    #[test]
    fn expired_deadline_times_out() {
        let options = SanitizeOptions {
            timeout: Some(Duration::ZERO),
            ..fast_options()
        };

        let err = sanitize("mail alice@example.com", "hunter2", &options).unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn literal_matching_a_substitute_survives_round_trip() {
        // "+1-555-0001" is the first phone dummy but has too few digits to be
        // detected itself; the generator must skip past it
        let text = "call 555-123-4567 or +1-555-0001";
        let (result, artifact) = sanitize(text, "hunter2", &fast_options()).unwrap();

        assert_eq!(result.sanitized_text, "call +1-555-0002 or +1-555-0001");

        let (restored, verdict) = recover(&result.sanitized_text, &artifact, "hunter2").unwrap();
        assert_eq!(restored, text);
        assert!(verdict.passed);
    }

    #[test]
    fn many_distinct_dates_round_trip() {
        let text = (1..=29)
            .map(|day| format!("backup finished 2023-03-{:02}", day))
            .collect::<Vec<_>>()
            .join("\n");

        let (result, artifact) = sanitize(&text, "hunter2", &fast_options()).unwrap();
        assert_eq!(result.entries.len(), 29);

        let (restored, verdict) = recover(&result.sanitized_text, &artifact, "hunter2").unwrap();
        assert_eq!(restored, text);
        assert!(verdict.passed);
    }

    #[test]
    fn repeated_values_map_consistently() {
        let text = "a@x.com then a@x.com and again a@x.com";
        let (result, _artifact) = sanitize(text, "hunter2", &fast_options()).unwrap();

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].occurrences, 3);
        assert_eq!(
            result.sanitized_text.matches("user001@example.com").count(),
            3
        );
    }
}
