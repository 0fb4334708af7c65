//! Persistence adapter: namespaced JSON values on top of a key-value backend
//!
//! Layout:
//!
//! ```text
//! <namespace>-current-step   -> 3
//! <namespace>-checklist      -> {"0-0": true, "0-1": false}
//! <namespace>-catalog-shape  -> [5, 5, 4]
//! ```
//!
//! Reads never fail: a missing, unreadable or malformed value comes back as
//! `None` and the caller substitutes its default.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::completion::CompletionState;
use crate::storage::{KeyValueStorage, StorageResult};

const CURRENT_STEP_SUFFIX: &str = "current-step";
const CHECKLIST_SUFFIX: &str = "checklist";
const CATALOG_SHAPE_SUFFIX: &str = "catalog-shape";

/// Namespaced typed access to a [`KeyValueStorage`]
#[derive(Debug)]
pub struct Persistence<S> {
    storage: S,
    namespace: String,
}

impl<S: KeyValueStorage> Persistence<S> {
    pub fn new(storage: S, namespace: impl Into<String>) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn current_step_key(&self) -> String {
        format!("{}-{}", self.namespace, CURRENT_STEP_SUFFIX)
    }

    pub fn checklist_key(&self) -> String {
        format!("{}-{}", self.namespace, CHECKLIST_SUFFIX)
    }

    pub fn catalog_shape_key(&self) -> String {
        format!("{}-{}", self.namespace, CATALOG_SHAPE_SUFFIX)
    }

    /// Persisted position, unclamped; may be negative if something wrote one
    ///
    /// Integral numbers outside the `i64` range saturate to its bounds, and a
    /// float with no fractional part (`2.0`) reads as that integer. Other
    /// fractions are malformed.
    pub fn load_current_step(&self) -> Option<i64> {
        let key = self.current_step_key();
        let number: serde_json::Number = self.read_json(&key)?;
        if let Some(position) = number.as_i64() {
            return Some(position);
        }
        match number.as_f64() {
            Some(value) if value.fract() == 0.0 => Some(value as i64),
            _ => {
                warn!(%key, %number, "Persisted position is not an integer, using default");
                None
            }
        }
    }

    pub fn load_checklist(&self) -> Option<CompletionState> {
        self.read_json(&self.checklist_key())
    }

    pub fn load_catalog_shape(&self) -> Option<Vec<usize>> {
        self.read_json(&self.catalog_shape_key())
    }

    pub fn save_current_step(&mut self, position: usize) -> StorageResult<()> {
        let key = self.current_step_key();
        self.write_json(&key, &position)
    }

    pub fn save_checklist(&mut self, completion: &CompletionState) -> StorageResult<()> {
        let key = self.checklist_key();
        self.write_json(&key, completion)
    }

    pub fn save_catalog_shape(&mut self, shape: &[usize]) -> StorageResult<()> {
        let key = self.catalog_shape_key();
        self.write_json(&key, &shape)
    }

    /// Remove every key this namespace owns
    ///
    /// A failed removal does not stop the others; the first error is returned.
    pub fn clear(&mut self) -> StorageResult<()> {
        let mut first_error = None;
        for key in [self.current_step_key(), self.checklist_key(), self.catalog_shape_key()] {
            if let Err(e) = self.storage.remove(&key) {
                warn!(%key, error = %e, "Failed to remove persisted value");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(%key, "read_json: no persisted value");
                return None;
            }
            Err(e) => {
                warn!(%key, error = %e, "Failed to read persisted value, using default");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%key, error = %e, "Malformed persisted value, using default");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.storage.set(key, &raw)
    }
}
