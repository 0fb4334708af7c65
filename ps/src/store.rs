//! ProgressStore - single writer for checklist completion and current position
//!
//! Mutations apply to memory first and then write through to persistence.
//! A failed write is logged and remembered, never returned: in-memory state is
//! authoritative for the running session.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Step};
use crate::completion::CompletionState;
use crate::key::ItemKey;
use crate::persistence::Persistence;
use crate::progress::{self, StaleEntry, StepProgress};
use crate::storage::{KeyValueStorage, StorageError, StorageResult};

/// Owns completion and position state for one catalog
#[derive(Debug)]
pub struct ProgressStore<S> {
    catalog: Arc<Catalog>,
    completion: CompletionState,
    position: usize,
    persistence: Persistence<S>,
    catalog_changed: bool,
    last_persist_error: Option<StorageError>,
}

impl<S: KeyValueStorage> ProgressStore<S> {
    /// Restore state from `persistence`, falling back to defaults
    ///
    /// Never fails. Missing or malformed values become an empty completion
    /// state and position 0; a restored position is clamped into the catalog.
    pub fn initialize(catalog: impl Into<Arc<Catalog>>, persistence: Persistence<S>) -> Self {
        let catalog = catalog.into();
        debug!(namespace = %persistence.namespace(), steps = catalog.len(), "ProgressStore::initialize: called");

        let completion = persistence.load_checklist().unwrap_or_default();
        let persisted_position = persistence.load_current_step().unwrap_or(0);
        let position = clamp_position(persisted_position, catalog.len());
        if position as i64 != persisted_position {
            warn!(persisted_position, position, "Persisted step out of range, clamped");
        }

        let shape = catalog.shape();
        let stored_shape = persistence.load_catalog_shape();
        let catalog_changed = stored_shape.as_ref().is_some_and(|stored| *stored != shape);
        if catalog_changed {
            warn!(
                ?stored_shape,
                current_shape = ?shape,
                "Catalog changed since progress was saved; completion flags are positional and may be misattributed"
            );
        }

        let mut store = Self {
            catalog,
            completion,
            position,
            persistence,
            catalog_changed,
            last_persist_error: None,
        };

        if stored_shape.as_deref() != Some(shape.as_slice()) {
            let result = store.persistence.save_catalog_shape(&shape);
            store.record("catalog shape", result);
        }

        let stale = store.stale_entries().len();
        info!(
            position = store.position,
            completed = store.completion.completed_count(),
            stale,
            "ProgressStore initialized"
        );
        store
    }

    // === Completion state ===

    /// Flip the completion flag of `(step, item)` and return the new value
    ///
    /// Positions are not checked against the catalog; whatever is given is
    /// recorded.
    pub fn toggle_item(&mut self, step: usize, item: usize) -> bool {
        debug!(step, item, "ProgressStore::toggle_item: called");
        let completed = self.completion.toggle(ItemKey::new(step, item));
        let result = self.persistence.save_checklist(&self.completion);
        self.record("checklist", result);
        completed
    }

    pub fn is_item_completed(&self, step: usize, item: usize) -> bool {
        self.completion.is_completed(ItemKey::new(step, item))
    }

    /// Read-only view of the completion state
    pub fn completion(&self) -> &CompletionState {
        &self.completion
    }

    /// Owned copy of the completion state
    pub fn completion_snapshot(&self) -> CompletionState {
        self.completion.clone()
    }

    // === Position state ===

    pub fn position(&self) -> usize {
        self.position
    }

    /// The step at the current position, `None` only for an empty catalog
    pub fn current_step(&self) -> Option<&Step> {
        self.catalog.step(self.position)
    }

    /// Move to `position`; out-of-range positions are ignored
    pub fn set_current_step(&mut self, position: usize) {
        debug!(position, "ProgressStore::set_current_step: called");
        if position >= self.catalog.len() {
            debug!(position, len = self.catalog.len(), "set_current_step: out of range, ignoring");
            return;
        }
        self.position = position;
        let result = self.persistence.save_current_step(position);
        self.record("current step", result);
    }

    /// Advance one step; no-op on the last step
    pub fn next_step(&mut self) {
        if !self.is_last_step() {
            self.set_current_step(self.position + 1);
        }
    }

    /// Go back one step; no-op on the first step
    pub fn previous_step(&mut self) {
        if !self.is_first_step() {
            self.set_current_step(self.position - 1);
        }
    }

    pub fn is_first_step(&self) -> bool {
        self.position == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.position + 1 >= self.catalog.len()
    }

    // === Derived values ===

    pub fn step_progress(&self, step: usize) -> StepProgress {
        progress::step_progress(&self.catalog, &self.completion, step)
    }

    pub fn step_summaries(&self) -> Vec<StepProgress> {
        progress::step_summaries(&self.catalog, &self.completion)
    }

    pub fn overall_progress(&self) -> u8 {
        progress::overall_progress(&self.catalog, &self.completion)
    }

    pub fn stale_entries(&self) -> Vec<StaleEntry> {
        progress::stale_entries(&self.catalog, &self.completion)
    }

    // === Housekeeping ===

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// Whether the catalog's checklist shape differs from the one progress was saved against
    pub fn catalog_changed(&self) -> bool {
        self.catalog_changed
    }

    /// Most recent persistence failure, cleared by the next successful write
    pub fn last_persist_error(&self) -> Option<&StorageError> {
        self.last_persist_error.as_ref()
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Forget all progress, in memory and in storage
    pub fn reset(&mut self) {
        info!(namespace = %self.persistence.namespace(), "Resetting progress");
        self.completion = CompletionState::new();
        self.position = 0;
        self.catalog_changed = false;
        let result = self.persistence.clear();
        self.record("reset", result);
    }

    fn record(&mut self, what: &str, result: StorageResult<()>) {
        match result {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                warn!(what, error = %e, "Failed to persist; keeping in-memory state");
                self.last_persist_error = Some(e);
            }
        }
    }
}

fn clamp_position(persisted: i64, len: usize) -> usize {
    if len == 0 || persisted <= 0 {
        return 0;
    }
    usize::try_from(persisted).map_or(len - 1, |p| p.min(len - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn two_step_catalog() -> Catalog {
        Catalog::from_steps(vec![
            Step::new(0, "first").with_checklist(["a", "b", "c"]),
            Step::new(1, "second").with_checklist(["d"]),
        ])
    }

    fn fresh(catalog: Catalog) -> ProgressStore<MemoryStorage> {
        ProgressStore::initialize(catalog, Persistence::new(MemoryStorage::new(), "test"))
    }

    fn reopen<S: KeyValueStorage>(store: ProgressStore<S>, catalog: Catalog) -> ProgressStore<S> {
        let namespace = store.persistence.namespace().to_string();
        let storage = store.persistence.into_storage();
        ProgressStore::initialize(catalog, Persistence::new(storage, namespace))
    }

    /// Storage whose writes always fail
    #[derive(Debug, Default)]
    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Io(std::io::Error::other("storage full")))
        }

        fn remove(&mut self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
    }

    #[test]
    fn test_first_run_defaults() {
        let store = fresh(two_step_catalog());
        assert_eq!(store.position(), 0);
        assert!(store.completion().is_empty());
        assert_eq!(store.overall_progress(), 0);
        assert!(!store.catalog_changed());
        assert!(store.last_persist_error().is_none());
    }

    #[test]
    fn test_scenario_progress_and_persistence() {
        let mut store = fresh(two_step_catalog());
        assert!(store.toggle_item(0, 0));
        store.toggle_item(0, 1);
        store.toggle_item(1, 0);

        assert_eq!(store.overall_progress(), 75);
        assert_eq!(
            store.step_progress(0),
            StepProgress {
                completed: 2,
                total: 3,
                is_complete: false
            }
        );
        assert!(store.step_progress(1).is_complete);

        let raw = store.persistence().storage().raw("test-checklist").unwrap();
        let json: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(json, serde_json::json!({"0-0": true, "0-1": true, "1-0": true}));
    }

    #[test]
    fn test_toggle_is_read_immediately() {
        let mut store = fresh(two_step_catalog());
        store.toggle_item(0, 2);
        assert!(store.is_item_completed(0, 2));
        store.toggle_item(0, 2);
        assert!(!store.is_item_completed(0, 2));
    }

    #[test]
    fn test_toggle_out_of_range_is_stored() {
        let mut store = fresh(two_step_catalog());
        store.toggle_item(9, 9);
        assert!(store.is_item_completed(9, 9));
        assert_eq!(store.stale_entries(), vec![StaleEntry::Position(ItemKey::new(9, 9))]);
        // counted in the overall numerator: 1/4
        assert_eq!(store.overall_progress(), 25);
    }

    #[test]
    fn test_set_current_step_bounds() {
        let mut store = fresh(two_step_catalog());
        store.set_current_step(1);
        assert_eq!(store.position(), 1);
        store.set_current_step(2);
        assert_eq!(store.position(), 1);
        store.set_current_step(usize::MAX);
        assert_eq!(store.position(), 1);
        store.set_current_step(0);
        assert_eq!(store.position(), 0);
        assert_eq!(store.persistence().storage().raw("test-current-step"), Some("0"));
    }

    #[test]
    fn test_next_and_previous_stop_at_bounds() {
        let mut store = fresh(two_step_catalog());
        store.previous_step();
        assert_eq!(store.position(), 0);
        assert!(store.is_first_step());

        store.next_step();
        assert_eq!(store.position(), 1);
        assert!(store.is_last_step());
        store.next_step();
        assert_eq!(store.position(), 1);

        store.previous_step();
        assert_eq!(store.position(), 0);
        assert_eq!(store.current_step().unwrap().title, "first");
    }

    #[test]
    fn test_empty_catalog_navigation() {
        let mut store = fresh(Catalog::default());
        store.next_step();
        store.previous_step();
        store.set_current_step(0);
        assert_eq!(store.position(), 0);
        assert!(store.current_step().is_none());
        assert_eq!(store.overall_progress(), 0);
    }

    #[test]
    fn test_restart_roundtrip() {
        let temp = TempDir::new().unwrap();
        let open = |catalog: Catalog| {
            let storage = crate::storage::FileStorage::open(temp.path()).unwrap();
            ProgressStore::initialize(catalog, Persistence::new(storage, "omicsinsight"))
        };

        let mut store = open(two_step_catalog());
        store.toggle_item(0, 0);
        store.toggle_item(1, 0);
        store.toggle_item(0, 2);
        store.toggle_item(0, 2);
        store.set_current_step(1);
        let before = (store.overall_progress(), store.step_summaries());
        drop(store);

        let store = open(two_step_catalog());
        assert_eq!(store.position(), 1);
        assert_eq!((store.overall_progress(), store.step_summaries()), before);
        assert!(!store.catalog_changed());
    }

    #[test]
    fn test_malformed_checklist_degrades_to_empty() {
        let storage = MemoryStorage::with_values([("test-checklist", "\"oops\""), ("test-current-step", "1")]);
        let store = ProgressStore::initialize(two_step_catalog(), Persistence::new(storage, "test"));
        assert!(store.completion().is_empty());
        assert_eq!(store.position(), 1);
    }

    #[test]
    fn test_persisted_position_is_clamped() {
        for (raw, expected) in [("7", 1), ("-2", 0), ("1.5", 0), ("null", 0), ("99999999999999999999", 1), ("2.0", 1)] {
            let storage = MemoryStorage::with_values([("test-current-step", raw)]);
            let store = ProgressStore::initialize(two_step_catalog(), Persistence::new(storage, "test"));
            assert_eq!(store.position(), expected, "persisted {raw}");
        }
    }

    #[test]
    fn test_unrecognized_persisted_keys_count_and_survive_toggle() {
        let storage = MemoryStorage::with_values([("test-checklist", r#"{"0-0":true,"01-1":true}"#)]);
        let mut store = ProgressStore::initialize(two_step_catalog(), Persistence::new(storage, "test"));
        assert_eq!(store.overall_progress(), 50);
        assert_eq!(store.stale_entries(), vec![StaleEntry::Unrecognized("01-1".to_string())]);

        store.toggle_item(0, 2);
        let raw = store.persistence().storage().raw("test-checklist").unwrap();
        let json: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(json, serde_json::json!({"0-0": true, "0-2": true, "01-1": true}));

        let store = reopen(store, two_step_catalog());
        assert_eq!(store.overall_progress(), 75);
    }

    #[test]
    fn test_shrunk_catalog_is_flagged_not_migrated() {
        let mut store = fresh(two_step_catalog());
        store.toggle_item(1, 0);
        store.set_current_step(1);

        let smaller = Catalog::from_steps(vec![Step::new(0, "first").with_checklist(["a", "b", "c"])]);
        let store = reopen(store, smaller);
        assert!(store.catalog_changed());
        assert_eq!(store.position(), 0);
        assert!(store.is_item_completed(1, 0));
        assert_eq!(store.stale_entries(), vec![StaleEntry::Position(ItemKey::new(1, 0))]);
        // stale entry still counts: 1/3
        assert_eq!(store.overall_progress(), 33);

        // the new shape is recorded, so the next session is quiet
        let store = reopen(store, Catalog::from_steps(vec![Step::new(0, "first").with_checklist(["a", "b", "c"])]));
        assert!(!store.catalog_changed());
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let mut store = ProgressStore::initialize(two_step_catalog(), Persistence::new(BrokenStorage, "test"));
        assert!(store.last_persist_error().is_some());

        store.toggle_item(0, 0);
        store.set_current_step(1);
        assert!(store.is_item_completed(0, 0));
        assert_eq!(store.position(), 1);
        assert!(matches!(store.last_persist_error(), Some(StorageError::Io(_))));

        store.reset();
        assert!(store.completion().is_empty());
        assert_eq!(store.position(), 0);
    }

    #[test]
    fn test_reset_clears_storage() {
        let mut store = fresh(two_step_catalog());
        store.toggle_item(0, 0);
        store.set_current_step(1);
        store.reset();

        assert!(store.completion().is_empty());
        assert_eq!(store.position(), 0);
        assert!(store.persistence().storage().is_empty());

        let store = reopen(store, two_step_catalog());
        assert_eq!(store.overall_progress(), 0);
        assert_eq!(store.position(), 0);
    }

    proptest! {
        #[test]
        fn prop_set_current_step_only_accepts_valid(start in 0usize..4, target in 0usize..10) {
            let catalog = Catalog::from_steps((0..4).map(|i| Step::new(i, "s")).collect());
            let mut store = fresh(catalog);
            store.set_current_step(start);
            store.set_current_step(target);
            let expected = if target < 4 { target } else { start };
            prop_assert_eq!(store.position(), expected);
        }

        #[test]
        fn prop_toggle_twice_restores_flag(step in 0usize..6, item in 0usize..6, pre in any::<bool>()) {
            let mut store = fresh(two_step_catalog());
            if pre {
                store.toggle_item(step, item);
            }
            let before = store.is_item_completed(step, item);
            store.toggle_item(step, item);
            store.toggle_item(step, item);
            prop_assert_eq!(store.is_item_completed(step, item), before);
        }
    }
}
