//! ProgressStore - checklist progress for guided step-by-step plans
//!
//! A plan is a fixed catalog of steps, each with examples and a checklist.
//! The store records which checklist items are done and which step is being
//! viewed, persists both, and derives per-step and overall progress.
//!
//! # Architecture
//!
//! ```text
//! Catalog (read-only) ──┐
//!                       ├─> ProgressStore ──> Persistence ──> KeyValueStorage
//! CompletionState ──────┘         │                            ├── FileStorage
//!                                 │                            └── MemoryStorage
//!                                 └─> progress::* / export::*
//! ```
//!
//! # Example
//!
//! ```ignore
//! use progressstore::{Catalog, FileStorage, Persistence, ProgressStore};
//!
//! let catalog = Catalog::load("steps.yml")?;
//! let storage = FileStorage::open(".progress")?;
//! let mut store = ProgressStore::initialize(catalog, Persistence::new(storage, "omicsinsight"));
//! store.toggle_item(0, 0);
//! println!("{}%", store.overall_progress());
//! ```

pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod export;
pub mod key;
pub mod persistence;
pub mod progress;
pub mod storage;
mod store;

pub use catalog::{Catalog, ChecklistItemDef, Example, Language, Step};
pub use completion::CompletionState;
pub use export::{ExportDocument, ExportedItem, ExportedStep, export_file_name, export_project, export_project_at};
pub use key::{ItemKey, ParseKeyError};
pub use persistence::Persistence;
pub use progress::{StaleEntry, StepProgress, overall_progress, stale_entries, step_progress, step_summaries};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError, StorageResult};
pub use store::ProgressStore;

/// Default prefix for persisted keys
pub const DEFAULT_NAMESPACE: &str = "omicsinsight";

/// Default product slug; exports are written to `<product>-plan.json`
pub const DEFAULT_PRODUCT: &str = "omicsinsight";

/// Default `projectName` in exported documents
pub const DEFAULT_PROJECT_NAME: &str = "OmicsInsight SaaS Plan";
