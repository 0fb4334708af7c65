//! Export of a plan with its checklist progress as a JSON document

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Catalog, Example};
use crate::completion::CompletionState;
use crate::key::ItemKey;

/// Exported checklist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedItem {
    pub text: String,
    pub completed: bool,
}

/// A catalog step with its checklist resolved against completion state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedStep {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub long_description: String,
    pub examples: Vec<Example>,
    pub checklist: Vec<ExportedItem>,
}

/// Top-level export document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub project_name: String,
    /// ISO-8601 UTC timestamp with millisecond precision
    pub export_date: String,
    pub steps: Vec<ExportedStep>,
}

/// Build the export document, stamped with the current time
pub fn export_project(catalog: &Catalog, completion: &CompletionState, project_name: &str) -> ExportDocument {
    export_project_at(catalog, completion, project_name, Utc::now())
}

/// Build the export document with an explicit timestamp
pub fn export_project_at(
    catalog: &Catalog,
    completion: &CompletionState,
    project_name: &str,
    at: DateTime<Utc>,
) -> ExportDocument {
    debug!(%project_name, steps = catalog.len(), "export_project_at: called");
    let steps = catalog
        .steps()
        .iter()
        .enumerate()
        .map(|(position, step)| ExportedStep {
            id: step.id,
            title: step.title.clone(),
            description: step.description.clone(),
            long_description: step.long_description.clone(),
            examples: step.examples.clone(),
            checklist: step
                .checklist
                .iter()
                .enumerate()
                .map(|(item, def)| ExportedItem {
                    text: def.text.clone(),
                    completed: completion.is_completed(ItemKey::new(position, item)),
                })
                .collect(),
        })
        .collect();

    ExportDocument {
        project_name: project_name.to_string(),
        export_date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        steps,
    }
}

/// File name exports are written under: `<product>-plan.json`
pub fn export_file_name(product: &str) -> String {
    format!("{}-plan.json", product)
}

impl ExportDocument {
    /// Pretty JSON with two-space indentation
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize export document")
    }

    /// Write to `<dir>/<product>-plan.json`, returning the written path
    pub fn write_to_dir(&self, dir: impl AsRef<Path>, product: &str) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context(format!("Failed to create export directory: {}", dir.display()))?;
        let path = dir.join(export_file_name(product));
        fs::write(&path, self.to_json_pretty()?).context(format!("Failed to write export: {}", path.display()))?;
        info!(path = %path.display(), "Exported plan");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Language, Step};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        let mut first = Step::new(0, "first").with_checklist(["a", "b", "c"]);
        first.long_description = "long".to_string();
        first.examples.push(Example::Code {
            title: "snippet".to_string(),
            language: Some(Language::Bash),
            content: "echo hi".to_string(),
        });
        Catalog::from_steps(vec![first, Step::new(1, "second").with_checklist(["d"])])
    }

    fn scenario_state() -> CompletionState {
        [(0, 0), (0, 1), (1, 0)]
            .into_iter()
            .map(|k| (ItemKey::from(k), true))
            .collect()
    }

    #[test]
    fn test_export_resolves_completion() {
        let doc = export_project(&catalog(), &scenario_state(), "OmicsInsight SaaS Plan");
        assert!(doc.steps[0].checklist[0].completed);
        assert!(!doc.steps[0].checklist[2].completed);
        assert!(doc.steps[1].checklist[0].completed);
        assert_eq!(doc.steps[0].checklist[1].text, "b");
    }

    #[test]
    fn test_export_json_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let doc = export_project_at(&catalog(), &CompletionState::new(), "Plan", at);
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["projectName"], "Plan");
        assert_eq!(json["exportDate"], "2024-03-05T14:07:09.000Z");
        assert_eq!(json["steps"][0]["longDescription"], "long");
        assert_eq!(json["steps"][0]["examples"][0]["type"], "code");
        assert_eq!(json["steps"][0]["examples"][0]["language"], "bash");
        assert_eq!(json["steps"][1]["checklist"][0], serde_json::json!({"text": "d", "completed": false}));
    }

    #[test]
    fn test_export_ignores_stale_and_false_entries() {
        let state: CompletionState = [(ItemKey::new(0, 0), false), (ItemKey::new(5, 0), true)]
            .into_iter()
            .collect();
        let doc = export_project(&catalog(), &state, "Plan");
        let done: usize = doc.steps.iter().flat_map(|s| &s.checklist).filter(|i| i.completed).count();
        assert_eq!(done, 0);
    }

    #[test]
    fn test_write_to_dir() {
        let temp = TempDir::new().unwrap();
        let doc = export_project(&catalog(), &scenario_state(), "Plan");
        let path = doc.write_to_dir(temp.path().join("out"), "omicsinsight").unwrap();

        assert_eq!(path.file_name().unwrap(), "omicsinsight-plan.json");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \"projectName\""));
        let back: ExportDocument = serde_json::from_str(&content).unwrap();
        assert_eq!(back, doc);
    }
}
