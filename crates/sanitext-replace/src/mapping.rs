//! Mapping construction
//!
//! Walks the resolved match set in start order, drives the dummy generator,
//! and produces the bidirectional mapping table plus the per-detection
//! substitutes the substitution engine consumes.

use crate::generator::DummyGenerator;
use sanitext_core::{Detection, MappingEntry};
use std::collections::HashMap;
use tracing::debug;

/// The original/substitute table for one run
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<MappingEntry> {
        self.entries
    }

    pub fn from_entries(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the mapping for `detections`, which must be non-overlapping and
/// ordered by start offset. Returns the table plus one substitute per
/// detection, aligned by index.
pub fn build_mapping(
    detections: &[Detection],
    mut generator: DummyGenerator,
) -> (MappingTable, Vec<String>) {
    let mut entries: Vec<MappingEntry> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();
    let mut substitutes = Vec::with_capacity(detections.len());

    for detection in detections {
        let substitute = generator.substitute_for(&detection.category, &detection.text);

        match index_of.get(&detection.text) {
            Some(&i) => entries[i].occurrences += 1,
            None => {
                index_of.insert(detection.text.clone(), entries.len());
                entries.push(MappingEntry {
                    original: detection.text.clone(),
                    substitute: substitute.clone(),
                    category: detection.category.clone(),
                    occurrences: 1,
                });
            }
        }

        substitutes.push(substitute);
    }

    debug!(
        detections = detections.len(),
        entries = entries.len(),
        "mapping built"
    );

    (MappingTable { entries }, substitutes)
}
