use std::collections::HashSet;

use crate::candidates::TLINK_WINDOW;
use crate::instances::{DTR_RADIUS, TLINK_PAD};

/// UMLS concept for chemotherapy
pub const DEFAULT_PROCEDURE_CODE: &str = "C0392920";

/// Configuration for one batch of chronology extraction
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ontology code a procedure mention must carry to be considered
    pub procedure_code: String,
    /// Run the modality classifier and keep only actual occurrences
    pub use_modality: bool,
    /// Run the DTR classifier and emit the DTR columns
    pub use_dtr: bool,
    /// Context tokens on each side of a DTR mention
    pub dtr_radius: usize,
    /// Context tokens around the TLink argument pair
    pub tlink_pad: usize,
    /// Maximum token distance between a focal mention and its TLink candidates
    pub tlink_window: usize,
    /// Lower-cased terms whose exact mentions are dropped before classification
    pub exclude_terms: HashSet<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            procedure_code: DEFAULT_PROCEDURE_CODE.to_string(),
            use_modality: true,
            use_dtr: true,
            dtr_radius: DTR_RADIUS,
            tlink_pad: TLINK_PAD,
            tlink_window: TLINK_WINDOW,
            exclude_terms: HashSet::new(),
        }
    }
}

impl PipelineConfig {
    /// Load exclusion terms from newline-separated text; blank lines are ignored
    pub fn with_exclude_terms(mut self, terms: &str) -> Self {
        self.exclude_terms = terms
            .lines()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    /// Whether a mention's covered text matches an exclusion term exactly
    pub fn is_excluded(&self, covered_text: &str) -> bool {
        !self.exclude_terms.is_empty()
            && self.exclude_terms.contains(&covered_text.trim().to_lowercase())
    }
}
