//! Substitution engine: forward sanitization and reverse restoration

use aho_corasick::{AhoCorasick, MatchKind};
use sanitext_core::{Detection, Error, MappingEntry, Result};
use tracing::debug;

/// Replace each detected span with its substitute. Detections must be
/// non-overlapping and ordered by start offset; substitutes align by index.
/// The source buffer is never mutated.
pub fn apply(text: &str, detections: &[Detection], substitutes: &[String]) -> String {
    debug_assert_eq!(detections.len(), substitutes.len());

    if detections.is_empty() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;
    // Substitute length rarely equals span length; the delta tracks how far
    // sanitized offsets have drifted from source offsets.
    let mut delta: isize = 0;

    for (detection, substitute) in detections.iter().zip(substitutes) {
        result.push_str(&text[last_end..detection.start]);
        result.push_str(substitute);
        delta += substitute.len() as isize - (detection.end - detection.start) as isize;
        last_end = detection.end;
    }

    result.push_str(&text[last_end..]);

    debug!(
        spans = detections.len(),
        length_delta = delta,
        "forward substitution applied"
    );
    result
}

/// Restore original values in sanitized text. Substitutes are matched
/// leftmost-longest so a substitute that is a substring of another can never
/// shadow it. Every mapped substitute must occur at least once; a missing one
/// means the sanitized text was edited and restoration would be lossy.
pub fn restore(text: &str, entries: &[MappingEntry]) -> Result<String> {
    if entries.is_empty() {
        return Ok(text.to_string());
    }

    let patterns: Vec<&str> = entries.iter().map(|e| e.substitute.as_str()).collect();
    let automaton = AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(&patterns)
        .map_err(|e| Error::Integrity(format!("substitute automaton: {}", e)))?;

    let mut seen = vec![false; entries.len()];
    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;

    for m in automaton.find_iter(text) {
        seen[m.pattern().as_usize()] = true;
        result.push_str(&text[last_end..m.start()]);
        result.push_str(&entries[m.pattern().as_usize()].original);
        last_end = m.end();
    }
    result.push_str(&text[last_end..]);

    if let Some(missing) = seen.iter().position(|&s| !s) {
        let entry = &entries[missing];
        return Err(Error::Integrity(format!(
            "substitute '{}' ({}) not found in sanitized text; was it edited?",
            entry.substitute, entry.category
        )));
    }

    debug!(entries = entries.len(), "reverse substitution applied");
    Ok(result)
}
