//! Composite key addressing one checklist item's completion flag
//!
//! Persisted form is `"<step>-<item>"`. Both directions of that encoding live
//! here and nowhere else.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Position of a checklist item: (step position, item position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    /// Position of the owning step in the catalog
    pub step: usize,
    /// Position of the item within the step's checklist
    pub item: usize,
}

/// Error parsing a persisted key string
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid item key: {0:?}")]
pub struct ParseKeyError(pub String);

impl ItemKey {
    pub fn new(step: usize, item: usize) -> Self {
        Self { step, item }
    }
}

impl From<(usize, usize)> for ItemKey {
    fn from((step, item): (usize, usize)) -> Self {
        Self { step, item }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.step, self.item)
    }
}

impl FromStr for ItemKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (step, item) = s.split_once('-').ok_or_else(|| ParseKeyError(s.to_string()))?;
        // usize parsing accepts "+1" and "01", both of which would alias "1"
        if !is_canonical(step) || !is_canonical(item) {
            return Err(ParseKeyError(s.to_string()));
        }
        let step = step.parse().map_err(|_| ParseKeyError(s.to_string()))?;
        let item = item.parse().map_err(|_| ParseKeyError(s.to_string()))?;
        Ok(Self { step, item })
    }
}

fn is_canonical(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && (s == "0" || !s.starts_with('0'))
}
