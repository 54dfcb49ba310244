//! Sensitive-data detector
//!
//! Scans text against the pattern registry, applies the per-category
//! contextual guards, and resolves overlapping candidates into a
//! non-overlapping match set ordered by start offset.

use crate::registry::{PatternRegistry, PatternRule};
use sanitext_core::{Category, Detection};
use tracing::{debug, trace};

/// Detections plus any non-fatal ambiguity warnings
#[derive(Debug, Clone, Default)]
pub struct DetectionOutcome {
    /// Resolved, non-overlapping matches ordered by start offset
    pub detections: Vec<Detection>,

    /// Overlap ambiguities that were resolved by policy rather than by
    /// priority alone. Surfaced to callers, never fatal.
    pub warnings: Vec<String>,
}

/// Scans text against a read-only pattern registry
pub struct Detector<'a> {
    registry: &'a PatternRegistry,
}

struct Candidate {
    detection: Detection,
    priority: i32,
}

impl<'a> Detector<'a> {
    pub fn new(registry: &'a PatternRegistry) -> Self {
        Self { registry }
    }

    /// Detect every sensitive span in `text`. An empty result is valid.
    pub fn detect(&self, text: &str) -> DetectionOutcome {
        let mut candidates = Vec::new();

        for rule in self.registry.rules() {
            for m in rule.matcher.find_iter(text) {
                let matched = m.as_str();
                if !passes_guard(rule, matched) {
                    trace!(rule = %rule.id, text = matched, "candidate rejected by guard");
                    continue;
                }

                candidates.push(Candidate {
                    detection: Detection {
                        category: rule.category.clone(),
                        start: m.start(),
                        end: m.end(),
                        text: matched.to_string(),
                        rule_id: rule.id.clone(),
                    },
                    priority: rule.priority,
                });
            }
        }

        let outcome = resolve_overlaps(candidates);
        debug!(
            matches = outcome.detections.len(),
            warnings = outcome.warnings.len(),
            "detection pass complete"
        );
        outcome
    }
}

/// Deterministic overlap resolution: priority desc, then span length desc,
/// then start offset asc; greedily keep candidates whose span does not
/// intersect any already-kept span.
fn resolve_overlaps(mut candidates: Vec<Candidate>) -> DetectionOutcome {
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| (b.detection.end - b.detection.start).cmp(&(a.detection.end - a.detection.start)))
            .then_with(|| a.detection.start.cmp(&b.detection.start))
    });

    let mut kept: Vec<Candidate> = Vec::new();
    let mut warnings = Vec::new();

    for candidate in candidates {
        let blocking = kept.iter().find(|k| {
            candidate.detection.start < k.detection.end
                && k.detection.start < candidate.detection.end
        });

        match blocking {
            None => kept.push(candidate),
            Some(keeper) => {
                // Same-priority cross-category overlaps are genuine
                // ambiguities; record them so the caller can review.
                if keeper.priority == candidate.priority
                    && keeper.detection.category != candidate.detection.category
                {
                    warnings.push(format!(
                        "ambiguous overlap at {}..{}: kept {} ('{}'), dropped {} ('{}')",
                        candidate.detection.start,
                        candidate.detection.end,
                        keeper.detection.category,
                        keeper.detection.text,
                        candidate.detection.category,
                        candidate.detection.text,
                    ));
                }
            }
        }
    }

    let mut detections: Vec<Detection> = kept.into_iter().map(|c| c.detection).collect();
    detections.sort_by_key(|d| d.start);

    DetectionOutcome {
        detections,
        warnings,
    }
}

/// Contextual guards that suppress false positives the raw regexes allow
fn passes_guard(rule: &PatternRule, text: &str) -> bool {
    match &rule.category {
        Category::CreditCard => luhn_valid(text),
        Category::FilePath => path_guard(text),
        Category::Phone => phone_guard(text),
        Category::ApiKey if rule.id == "api_key_generic" => generic_key_guard(text),
        Category::AccessToken if rule.id == "access_token_generic" => generic_key_guard(text),
        _ => true,
    }
}

/// Luhn checksum, shared with dummy credit-card generation
pub fn luhn_valid(number: &str) -> bool {
    let digits: Vec<u32> = number
        .chars()
        .filter(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }

    let checksum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    checksum % 10 == 0
}

/// A path-like match must look like a real path: at least two separators,
/// or a recognized file extension.
fn path_guard(path: &str) -> bool {
    let separators = path.chars().filter(|&c| c == '/' || c == '\\').count();
    if separators >= 2 {
        return true;
    }

    const KNOWN_EXTENSIONS: [&str; 16] = [
        ".txt", ".md", ".rst", ".py", ".js", ".rs", ".java", ".cpp", ".c", ".h", ".json",
        ".yaml", ".yml", ".ini", ".conf", ".log",
    ];
    KNOWN_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// US/Canada numbers are 10 or 11 digits (11 must lead with 1);
/// international up to 15.
fn phone_guard(phone: &str) -> bool {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 10 || digits.len() > 15 {
        return false;
    }

    if digits.len() == 11 && !phone.starts_with('+') && !digits.starts_with('1') {
        return false;
    }

    true
}

/// Long alphanumeric runs are only credential-shaped when they mix letters
/// and digits; this drops ordinary long words and pure digit runs.
fn generic_key_guard(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic()) && text.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests;
