//! Progress derivations over catalog + completion snapshots
//!
//! Everything here is a pure function of its inputs and is recomputed on
//! demand. Nothing is cached between calls.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::completion::CompletionState;
use crate::key::ItemKey;

/// Completion summary for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepProgress {
    pub completed: usize,
    pub total: usize,
    /// True only when the step has a checklist and every item is done
    pub is_complete: bool,
}

impl StepProgress {
    /// Completed share of this step, 0.0 when there is no checklist
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Progress of the step at `position`
///
/// Only items inside the step's current checklist are counted. A step with no
/// checklist, or a position past the end of the catalog, reports `0/0` and is
/// never complete.
pub fn step_progress(catalog: &Catalog, completion: &CompletionState, position: usize) -> StepProgress {
    let total = catalog.checklist_len(position);
    let completed = (0..total)
        .filter(|item| completion.is_completed(ItemKey::new(position, *item)))
        .count();
    StepProgress {
        completed,
        total,
        is_complete: total > 0 && completed == total,
    }
}

/// Progress of every step, in catalog order
pub fn step_summaries(catalog: &Catalog, completion: &CompletionState) -> Vec<StepProgress> {
    (0..catalog.len())
        .map(|position| step_progress(catalog, completion, position))
        .collect()
}

/// Overall completion percentage in `0..=100`
///
/// The numerator counts every true entry in `completion`, including entries
/// outside the current catalog. Rounds half up, and clamps to 100 when stale
/// entries push the count past the catalog total.
pub fn overall_progress(catalog: &Catalog, completion: &CompletionState) -> u8 {
    let total = catalog.total_items();
    if total == 0 {
        return 0;
    }
    let completed = completion.completed_count();
    percent_round_half_up(completed, total).min(100) as u8
}

/// `round(100 * part / whole)` with halves rounded up, in integer arithmetic
fn percent_round_half_up(part: usize, whole: usize) -> usize {
    (200 * part + whole) / (2 * whole)
}

/// A true completion entry that does not address any item in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleEntry {
    /// Well-formed key pointing past a step or checklist end
    Position(ItemKey),
    /// Persisted key that is not of the `"<step>-<item>"` form
    Unrecognized(String),
}

impl std::fmt::Display for StaleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position(key) => write!(f, "{}", key),
            Self::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

/// True entries that count toward overall progress but match no catalog item
pub fn stale_entries(catalog: &Catalog, completion: &CompletionState) -> Vec<StaleEntry> {
    let positional = completion
        .completed_keys()
        .filter(|key| !catalog.contains(key.step, key.item))
        .map(StaleEntry::Position);
    let unrecognized = completion
        .unrecognized_keys()
        .map(|raw| StaleEntry::Unrecognized(raw.to_string()));
    positional.chain(unrecognized).collect()
}
