//! Content catalog: the ordered, read-only list of steps
//!
//! Steps are addressed by position. `Step::id` is a display label only and is
//! never used to look anything up.

use std::fs;
use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Language tag for code examples
///
/// Tags outside the known set are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
    Sql,
    Bash,
    Json,
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Javascript => "javascript",
            Self::Python => "python",
            Self::Sql => "sql",
            Self::Bash => "bash",
            Self::Json => "json",
            Self::Other(tag) => tag.as_str(),
        };
        write!(f, "{}", name)
    }
}

/// Illustrative example attached to a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Example {
    /// Literal source code in a given language
    Code {
        #[serde(default)]
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<Language>,
        content: String,
    },
    /// Free-form prose
    Text {
        #[serde(default)]
        title: String,
        content: String,
    },
    /// Image; `content` is a URI
    Image {
        #[serde(default)]
        title: String,
        content: String,
    },
}

impl Example {
    pub fn title(&self) -> &str {
        match self {
            Self::Code { title, .. } | Self::Text { title, .. } | Self::Image { title, .. } => title,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Code { content, .. } | Self::Text { content, .. } | Self::Image { content, .. } => content,
        }
    }
}

/// One checklist entry; its identity is its position in the owning step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemDef {
    pub text: String,
}

impl ChecklistItemDef {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A single step of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Human-facing label
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItemDef>,
}

impl Step {
    /// Create a step with no examples and no checklist
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            long_description: String::new(),
            examples: Vec::new(),
            checklist: Vec::new(),
        }
    }

    /// Builder-style checklist setter
    pub fn with_checklist<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checklist = items.into_iter().map(ChecklistItemDef::new).collect();
        self
    }
}

/// Ordered, immutable sequence of steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    steps: Vec<Step>,
}

impl Catalog {
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Load a catalog from a YAML or JSON file, chosen by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Catalog::load: called");
        let content =
            fs::read_to_string(path).context(format!("Failed to read catalog file: {}", path.display()))?;

        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        let parsed = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };
        let catalog = parsed.context(format!("Failed to parse catalog file: {}", path.display()))?;

        info!(steps = catalog.len(), total_items = catalog.total_items(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, position: usize) -> Option<&Step> {
        self.steps.get(position)
    }

    /// Checklist length of the step at `position`, 0 when there is no such step
    pub fn checklist_len(&self, position: usize) -> usize {
        self.step(position).map(|s| s.checklist.len()).unwrap_or(0)
    }

    /// Sum of checklist lengths over every step
    pub fn total_items(&self) -> usize {
        self.steps.iter().map(|s| s.checklist.len()).sum()
    }

    /// Checklist length per step, in order
    pub fn shape(&self) -> Vec<usize> {
        self.steps.iter().map(|s| s.checklist.len()).collect()
    }

    /// Whether `(step, item)` addresses an item that exists in this catalog
    pub fn contains(&self, step: usize, item: usize) -> bool {
        item < self.checklist_len(step)
    }
}
